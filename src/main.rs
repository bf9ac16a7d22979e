fn main() -> std::process::ExitCode {
    twid_lib::run()
}
