fn main() {
    lodestone::board::init();
    lodestone::uci::run();
}
