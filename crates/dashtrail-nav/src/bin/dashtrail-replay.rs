fn main() {
    std::process::exit(dashtrail_nav::replay::run_from_env());
}
