use superspreader::runner::run_from_command_line;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    run_from_command_line()
}
