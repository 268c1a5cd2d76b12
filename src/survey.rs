use log::{debug, info, warn};

use poll_core::store::{load_from_file, save_to_file};
use poll_core::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io;

use serde::{Deserialize, Serialize};

pub mod menu;

pub use crate::survey::menu::SurveyUi;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("{source}"))]
    Poll { source: PollError },
    #[snafu(display("Error talking to the console: {source}"))]
    Console { source: io::Error },
    #[snafu(display("Error writing the summary to {path}: {source}"))]
    WritingSummary { source: io::Error, path: String },
    #[snafu(display("Error serializing the summary: {source}"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("The console input was closed"))]
    InputClosed {},
    #[snafu(display("--results and --out need a poll file, pass one with --file"))]
    MissingPollFile {},
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// One row of the results, in rank order.
///
/// Options with the same number of votes share the same rank.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRow {
    pub rank: u32,
    pub id: String,
    pub text: String,
    pub votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub question: String,
    #[serde(rename = "totalVotes")]
    pub total_votes: u64,
    pub results: Vec<ScoreRow>,
}

pub fn build_summary(poll: &Poll) -> ResultsSummary {
    let mut results: Vec<ScoreRow> = Vec::new();
    let mut rank: u32 = 0;
    let mut previous_votes: Option<u64> = None;
    for (idx, score) in poll.calculate_scores().iter().enumerate() {
        if previous_votes != Some(score.votes) {
            rank = idx as u32 + 1;
            previous_votes = Some(score.votes);
        }
        results.push(ScoreRow {
            rank,
            id: score.option.id().to_string(),
            text: score.option.text().to_string(),
            votes: score.votes,
        });
    }
    ResultsSummary {
        question: poll.question().to_string(),
        total_votes: poll.vote_count(),
        results,
    }
}

/// The results as a plain text table, best option first.
pub fn format_results(poll: &Poll) -> String {
    let mut res = format!("{:<23} | {:<5}\n", "Option", "Votes");
    res.push_str(&"-".repeat(31));
    res.push('\n');
    for score in poll.calculate_scores() {
        res.push_str(&format!(
            "{:<3}{:<20} | {:>5}\n",
            score.option.id(),
            score.option.text(),
            score.votes
        ));
    }
    res
}

/// Writes the JSON summary to `out`, which is either a file path, or `stdout`
/// (or empty) for the standard output.
pub fn write_summary(summary: &ResultsSummary, out: &str) -> SurveyResult<()> {
    let pretty_js = serde_json::to_string_pretty(summary).context(SerializingJsonSnafu {})?;
    if out.is_empty() || out == "stdout" {
        println!("{}", pretty_js);
    } else {
        info!("Writing results summary to {:?}", out);
        fs::write(out, pretty_js).context(WritingSummarySnafu {
            path: out.to_string(),
        })?;
    }
    Ok(())
}

/// Runs the program against the given console.
///
/// With a poll file and `results` or `out`, only reports the results.
/// Otherwise starts the interactive session, opening the poll file first if
/// there is one. A closed input ends the session without error.
pub fn run_survey<R: io::BufRead, W: io::Write>(
    file: Option<String>,
    results: bool,
    out: Option<String>,
    ui: &mut SurveyUi<R, W>,
) -> SurveyResult<()> {
    let report_only = results || out.is_some();
    let session = match file {
        Some(path) => {
            let poll = load_from_file(&path).context(PollSnafu {})?;
            info!(
                "Loaded poll {:?} from {:?}: {} options, {} votes",
                poll.question(),
                path,
                poll.len(),
                poll.vote_count()
            );
            if report_only {
                if results {
                    ui.show(&format_results(&poll))?;
                }
                if let Some(out_path) = out {
                    write_summary(&build_summary(&poll), &out_path)?;
                }
                return Ok(());
            }
            ui.open(poll, &path)
        }
        None => {
            ensure!(!report_only, MissingPollFileSnafu {});
            Ok(())
        }
    }
    .and_then(|_| ui.start());

    match session {
        Err(SurveyError::InputClosed {}) => {
            debug!("run_survey: input closed, leaving");
            Ok(())
        }
        Err(e) => {
            warn!("run_survey: session ended with an error: {}", e);
            Err(e)
        }
        Ok(()) => Ok(()),
    }
}

/// Saves the poll, reporting the outcome in the logs.
pub(crate) fn save_poll(poll: &Poll, path: &str) -> PollResult<()> {
    let res = save_to_file(poll, path);
    match &res {
        Ok(()) => info!(
            "Saved poll {:?} to {:?}: {} options, {} votes",
            poll.question(),
            path,
            poll.len(),
            poll.vote_count()
        ),
        Err(e) => warn!("Could not save poll to {:?}: {}", path, e),
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn colors() -> Poll {
        let mut poll = Poll::new("Best color?").unwrap();
        poll.set_option("r", "Red").unwrap();
        poll.set_option("g", "Green").unwrap();
        poll.set_option("b", "Blue").unwrap();
        poll.set_option("y", "Yellow").unwrap();
        for token in ["g", "r", "g", "b"] {
            poll.vote(token);
        }
        poll
    }

    fn console(input: &str) -> SurveyUi<Cursor<Vec<u8>>, Vec<u8>> {
        SurveyUi::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn summary_ranks_share_ties() {
        let summary = build_summary(&colors());
        assert_eq!(summary.question, "Best color?");
        assert_eq!(summary.total_votes, 4);
        let rows: Vec<(u32, &str, u64)> = summary
            .results
            .iter()
            .map(|r| (r.rank, r.id.as_str(), r.votes))
            .collect();
        assert_eq!(rows, vec![(1, "g", 2), (2, "r", 1), (2, "b", 1), (4, "y", 0)]);
    }

    #[test]
    fn results_table() {
        let table = format_results(&colors());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Option                  | Votes");
        assert_eq!(lines[2], "g  Green                |     2");
        assert_eq!(lines[5], "y  Yellow               |     0");
    }

    #[test]
    fn summary_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("summary.json");
        let summary = build_summary(&colors());
        write_summary(&summary, out.to_str().unwrap()).unwrap();

        let contents = fs::read_to_string(&out).unwrap();
        assert!(contents.contains("\"totalVotes\": 4"));
        let read_back: ResultsSummary = serde_json::from_str(&contents).unwrap();
        assert_eq!(read_back, summary);
    }

    #[test]
    fn empty_out_goes_to_stdout() {
        // Writing to the path "" would fail.
        assert!(write_summary(&build_summary(&colors()), "").is_ok());
        assert!(write_summary(&build_summary(&colors()), "stdout").is_ok());
    }

    #[test]
    fn invalid_option_is_a_poll_error() {
        let mut poll = Poll::new("q").unwrap();
        let res = poll.set_option("", "A").context(PollSnafu {});
        assert!(matches!(
            res,
            Err(SurveyError::Poll {
                source: PollError::InvalidArgument { field: "id" }
            })
        ));
    }

    #[test]
    fn report_only_mode() {
        let dir = tempfile::tempdir().unwrap();
        let poll_path = dir.path().join("colors.poll");
        let out = dir.path().join("out.json");
        save_to_file(&colors(), &poll_path).unwrap();

        let mut ui = console("");
        run_survey(
            Some(poll_path.to_str().unwrap().to_string()),
            true,
            Some(out.to_str().unwrap().to_string()),
            &mut ui,
        )
        .unwrap();

        let printed = String::from_utf8(ui.into_output()).unwrap();
        assert!(printed.contains("g  Green"));
        assert!(out.exists());
    }

    #[test]
    fn report_needs_a_poll_file() {
        let mut ui = console("");
        let res = run_survey(None, true, None, &mut ui);
        assert!(matches!(res, Err(SurveyError::MissingPollFile {})));
    }

    #[test]
    fn unreadable_poll_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.poll");
        let mut ui = console("");
        let res = run_survey(Some(path.to_str().unwrap().to_string()), false, None, &mut ui);
        assert!(matches!(
            res,
            Err(SurveyError::Poll {
                source: PollError::Io { .. }
            })
        ));
    }

    #[test]
    fn closed_input_ends_the_session() {
        let mut ui = console("1\n");
        assert!(run_survey(None, false, None, &mut ui).is_ok());
    }
}
