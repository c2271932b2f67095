fn main() {
    std::process::exit(taskpad_lib::run())
}
