// Interactive menus. They only read answers, call into the poll and print
// the outcome; retrying on bad answers happens here.

use std::fmt::Display;
use std::io::{BufRead, Write};

use log::{debug, info, warn};

use crate::survey::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum MainChoice {
    Create,
    Load,
    Quit,
}

pub struct SurveyUi<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> SurveyUi<R, W> {
    pub fn new(input: R, output: W) -> SurveyUi<R, W> {
        SurveyUi { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs the main menu until the user quits.
    pub fn start(&mut self) -> SurveyResult<()> {
        loop {
            let (mut poll, path) = match self.main_menu()? {
                MainChoice::Create => self.create_menu()?,
                MainChoice::Load => self.load_menu()?,
                MainChoice::Quit => return Ok(()),
            };
            self.poll_menu(&mut poll, &path)?;
        }
    }

    /// Shows the menu of a poll that is already loaded from `path`.
    pub fn open(&mut self, mut poll: Poll, path: &str) -> SurveyResult<()> {
        self.poll_menu(&mut poll, path)
    }

    pub fn show(&mut self, text: impl Display) -> SurveyResult<()> {
        writeln!(self.output, "{}", text).context(ConsoleSnafu {})
    }

    fn blank_lines(&mut self, num_lines: usize) -> SurveyResult<()> {
        for _ in 0..num_lines {
            self.show("")?;
        }
        Ok(())
    }

    fn title(&mut self, title: &str) -> SurveyResult<()> {
        self.blank_lines(1)?;
        self.show(title)?;
        self.show("-".repeat(title.chars().count()))
    }

    /// Prints `label` and reads one line, without its line terminator.
    fn prompt(&mut self, label: impl Display) -> SurveyResult<String> {
        write!(self.output, "{}", label).context(ConsoleSnafu {})?;
        self.output.flush().context(ConsoleSnafu {})?;
        let mut line = String::new();
        let num_read = self.input.read_line(&mut line).context(ConsoleSnafu {})?;
        ensure!(num_read > 0, InputClosedSnafu {});
        Ok(line.trim_end_matches(|c: char| c == '\n' || c == '\r').to_string())
    }

    fn prompt_non_empty(&mut self, label: impl Display + Copy) -> SurveyResult<String> {
        loop {
            let answer = self.prompt(label)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
        }
    }

    fn main_menu(&mut self) -> SurveyResult<MainChoice> {
        loop {
            self.title("MAIN MENU")?;
            self.show("1 - Create a poll")?;
            self.show("2 - Load a poll")?;
            self.show("3 - Quit")?;
            self.blank_lines(1)?;
            match self.prompt("What do you want to do? => ")?.as_str() {
                "1" => return Ok(MainChoice::Create),
                "2" => return Ok(MainChoice::Load),
                "3" => return Ok(MainChoice::Quit),
                x => debug!("main_menu: ignoring answer {:?}", x),
            }
        }
    }

    fn create_menu(&mut self) -> SurveyResult<(Poll, String)> {
        self.title("CREATE A NEW POLL")?;
        self.blank_lines(1)?;

        let mut poll = loop {
            let question = self.prompt("Question: ")?;
            if let Ok(poll) = Poll::new(question) {
                break poll;
            }
        };
        self.blank_lines(1)?;

        let num_options = loop {
            let answer = self.prompt("How many options will the question have? ")?;
            if let Ok(n) = answer.trim().parse::<usize>() {
                break n;
            }
        };
        self.blank_lines(1)?;

        for idx in 1..=num_options {
            let id = self.prompt_non_empty(format_args!("Id of option {}: ", idx))?;
            let text = self.prompt_non_empty(format_args!("Text of option {}: ", idx))?;
            poll.set_option(id, text).context(PollSnafu {})?;
            self.blank_lines(1)?;
        }

        self.show("Options added! Here is the poll:")?;
        self.blank_lines(1)?;
        self.show(poll.formatted_question_and_options())?;
        self.blank_lines(1)?;

        let path = loop {
            let path = self.prompt_non_empty("Path of the file to save the poll in: ")?;
            match save_poll(&poll, &path) {
                Ok(()) => break path,
                Err(e) => self.show(format_args!("Error while saving the file: {}", e))?,
            }
        };
        self.blank_lines(1)?;
        self.prompt(format_args!(
            "Poll saved in \"{}\". Press ENTER to continue...",
            path
        ))?;
        Ok((poll, path))
    }

    fn load_menu(&mut self) -> SurveyResult<(Poll, String)> {
        self.title("LOAD A POLL")?;
        self.blank_lines(1)?;

        loop {
            let path = self.prompt_non_empty("Name of the poll file: ")?;
            match load_from_file(&path) {
                Ok(poll) => {
                    info!(
                        "Loaded poll {:?} from {:?}: {} options, {} votes",
                        poll.question(),
                        path,
                        poll.len(),
                        poll.vote_count()
                    );
                    self.prompt("The poll was loaded! Press ENTER to continue...")?;
                    return Ok((poll, path));
                }
                Err(e) => {
                    warn!("Could not load poll from {:?}: {}", path, e);
                    self.show(format_args!("Error while opening the file: {}", e))?;
                }
            }
        }
    }

    fn poll_menu(&mut self, poll: &mut Poll, path: &str) -> SurveyResult<()> {
        loop {
            self.title("POLL MENU")?;
            self.blank_lines(1)?;
            self.show(format_args!("Active poll: \"{}\"", poll.question()))?;
            self.show(format_args!("Number of votes: {}", poll.vote_count()))?;
            self.blank_lines(1)?;
            self.show("1 - Vote")?;
            self.show("2 - See the results")?;
            self.show("3 - Back to the main menu")?;
            self.blank_lines(1)?;
            match self.prompt("Choose an option => ")?.as_str() {
                "1" => self.vote_menu(poll, path)?,
                "2" => self.results_menu(poll)?,
                "3" => return Ok(()),
                _ => {}
            }
        }
    }

    fn vote_menu(&mut self, poll: &mut Poll, path: &str) -> SurveyResult<()> {
        let voting = self.collect_votes(poll);

        // Votes cast so far are kept even if the console went away.
        self.blank_lines(1)?;
        if let Err(e) = save_poll(poll, path) {
            self.show(format_args!("Error while saving the votes: {}", e))?;
        }
        voting?;

        self.prompt("Voting finished. Press ENTER to continue...")?;
        Ok(())
    }

    fn collect_votes(&mut self, poll: &mut Poll) -> SurveyResult<()> {
        loop {
            self.title("VOTE")?;
            self.blank_lines(1)?;
            self.show(format_args!("Number of votes: {}", poll.vote_count()))?;
            self.blank_lines(1)?;
            self.show(poll.formatted_question_and_options())?;
            let token = self.prompt("Choose an option => ")?;

            match poll.vote(&token) {
                Some(option) => {
                    debug!("collect_votes: vote for {:?}", option.id());
                }
                None => {
                    debug!("collect_votes: rejected vote {:?}", token);
                    continue;
                }
            }

            self.blank_lines(1)?;
            let answer = self.prompt("Thank you for voting! Keep voting? (y/n): ")?;
            if answer != "y" && answer != "Y" {
                return Ok(());
            }
        }
    }

    fn results_menu(&mut self, poll: &Poll) -> SurveyResult<()> {
        self.title("POLL RESULTS")?;
        self.blank_lines(1)?;
        self.show(format_results(poll))?;
        self.prompt("Press ENTER to continue...")?;
        Ok(())
    }
}
