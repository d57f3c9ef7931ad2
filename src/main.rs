fn main() {
    mag3dview::run();
}
