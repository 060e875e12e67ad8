use clap::error::ErrorKind;
use clap::Parser;

fn main() {
    let cli = match tcreds::cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    let _ = e.print();
                }
                _ => {
                    let rendered = e.render().to_string();
                    println!("Error: {}", rendered.trim_start_matches("error: ").trim_end());
                }
            }
            return;
        }
    };

    // Failures are reported, not signalled through the exit status.
    if let Err(e) = cli.run() {
        println!("Error: {:#}", e);
    }
}
