mod args;
mod survey;

use clap::Parser;
use log::{error, LevelFilter};
use std::io;

use crate::args::Args;
use crate::survey::{run_survey, SurveyUi};

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut ui = SurveyUi::new(stdin.lock(), stdout.lock());

    let res = run_survey(args.file, args.results, args.out, &mut ui);
    if let Err(e) = res {
        error!("{:?}", e);
        eprintln!("An error occurred: {}", e);
        std::process::exit(1);
    }
}
