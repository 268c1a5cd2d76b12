use clap::Parser;

/// Console program to create multiple-choice polls, vote on them and see the results.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A poll file to open at start-up. The program then goes straight
    /// to the menu of this poll instead of the main menu.
    #[clap(short, long, value_parser)]
    pub file: Option<String>,

    /// If passed as an argument together with --file, prints the ranked results of the poll
    /// and exits without starting the interactive session.
    #[clap(long, takes_value = false)]
    pub results: bool,

    /// (file path, 'stdout' or empty) If specified together with --file, a summary of the
    /// ranked results will be written in JSON format to the given location, and the program
    /// exits.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
