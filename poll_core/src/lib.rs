mod model;
pub mod store;

use snafu::ensure;

pub use crate::model::*;

// Invariant: `votes` only changes through `Poll::vote`.
#[derive(Debug, Clone)]
struct Tally {
    option: PollOption,
    votes: u64,
}

/// A question, its options in authoring order and the votes each option got.
///
/// ```
/// use poll_core::Poll;
/// # use poll_core::PollError;
///
/// let mut poll = Poll::new("Best color?")?;
/// poll.set_option("r", "Red")?;
/// poll.set_option("g", "Green")?;
///
/// assert!(poll.vote("g").is_some());
/// assert!(poll.vote("z").is_none());
/// assert_eq!(poll.vote_count(), 1);
/// assert_eq!(poll.calculate_scores()[0].as_row(), ("g", "Green", 1));
/// # Ok::<(), PollError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Poll {
    question: String,
    tallies: Vec<Tally>,
    // Sum of all the tallies.
    total_votes: u64,
}

impl Poll {
    /// Creates a poll without any option.
    pub fn new(question: impl Into<String>) -> PollResult<Poll> {
        let question = question.into();
        ensure!(
            !question.is_empty(),
            InvalidArgumentSnafu { field: "question" }
        );
        Ok(Poll {
            question,
            tallies: Vec::new(),
            total_votes: 0,
        })
    }

    /// Rebuilds a poll from stored records. The records must already be
    /// validated: non-empty, unique ids, tallies summing to `total_votes`.
    pub(crate) fn from_records(
        question: String,
        records: Vec<(PollOption, u64)>,
        total_votes: u64,
    ) -> Poll {
        Poll {
            question,
            tallies: records
                .into_iter()
                .map(|(option, votes)| Tally { option, votes })
                .collect(),
            total_votes,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// The options with their current number of votes, in authoring order.
    pub fn options(&self) -> impl Iterator<Item = (&PollOption, u64)> + '_ {
        self.tallies.iter().map(|t| (&t.option, t.votes))
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// The number of votes received by the option `id`, if there is such an option.
    pub fn votes_for(&self, id: &str) -> Option<u64> {
        self.tallies
            .iter()
            .find(|t| t.option.id() == id)
            .map(|t| t.votes)
    }

    /// The total number of accepted votes.
    pub fn vote_count(&self) -> u64 {
        self.total_votes
    }

    /// Registers an option.
    ///
    /// If an option with the same id already exists, only its text is
    /// replaced: it keeps its votes and its position.
    pub fn set_option(&mut self, id: impl Into<String>, text: impl Into<String>) -> PollResult<()> {
        let option = PollOption::new(id, text);
        ensure!(!option.id().is_empty(), InvalidArgumentSnafu { field: "id" });
        ensure!(
            !option.text().is_empty(),
            InvalidArgumentSnafu { field: "text" }
        );
        match self.tallies.iter_mut().find(|t| t.option == option) {
            Some(tally) => tally.option = option,
            None => self.tallies.push(Tally { option, votes: 0 }),
        }
        Ok(())
    }

    /// Casts a vote for the option whose id is exactly `token`.
    ///
    /// Returns the chosen option, or `None` when no option matches or when
    /// the total number of votes cannot grow any more. A rejected vote
    /// leaves the poll untouched.
    pub fn vote(&mut self, token: &str) -> Option<&PollOption> {
        let tally = self.tallies.iter_mut().find(|t| t.option.id() == token)?;
        // Each tally is at most the total, so only the total can overflow.
        self.total_votes = self.total_votes.checked_add(1)?;
        tally.votes += 1;
        Some(&tally.option)
    }

    /// The options sorted by decreasing number of votes.
    ///
    /// Options with the same number of votes keep their authoring order.
    pub fn calculate_scores(&self) -> Vec<Score> {
        let mut scores: Vec<Score> = self
            .tallies
            .iter()
            .map(|t| Score {
                option: t.option.clone(),
                votes: t.votes,
            })
            .collect();
        // sort_by is stable.
        scores.sort_by(|a, b| b.votes.cmp(&a.votes));
        scores
    }

    /// The question followed by one `id - text` line per option, in authoring order.
    pub fn formatted_question_and_options(&self) -> String {
        let mut res = self.question.clone();
        res.push('\n');
        for t in self.tallies.iter() {
            res.push_str(&format!("\n{} - {}", t.option.id(), t.option.text()));
        }
        res
    }
}

/// Structural equality: same question and same `(id, text, votes)` rows in
/// the same order. Unlike `PollOption` equality, the text is compared.
impl PartialEq for Poll {
    fn eq(&self, other: &Self) -> bool {
        self.question == other.question
            && self.total_votes == other.total_votes
            && self.tallies.len() == other.tallies.len()
            && self.tallies.iter().zip(other.tallies.iter()).all(|(a, b)| {
                a.option.id() == b.option.id()
                    && a.option.text() == b.option.text()
                    && a.votes == b.votes
            })
    }
}

impl Eq for Poll {}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> Poll {
        let mut poll = Poll::new("Best color?").unwrap();
        poll.set_option("r", "Red").unwrap();
        poll.set_option("g", "Green").unwrap();
        poll.set_option("b", "Blue").unwrap();
        poll
    }

    fn rows(scores: &[Score]) -> Vec<(&str, &str, u64)> {
        scores.iter().map(|s| s.as_row()).collect()
    }

    #[test]
    fn new_poll_is_empty() {
        let poll = Poll::new("Anything?").unwrap();
        assert_eq!(poll.question(), "Anything?");
        assert!(poll.is_empty());
        assert_eq!(poll.vote_count(), 0);
    }

    #[test]
    fn empty_question_is_rejected() {
        assert!(matches!(
            Poll::new(""),
            Err(PollError::InvalidArgument { field: "question" })
        ));
    }

    #[test]
    fn empty_id_or_text_is_rejected() {
        let mut poll = Poll::new("q").unwrap();
        assert!(matches!(
            poll.set_option("", "Red"),
            Err(PollError::InvalidArgument { field: "id" })
        ));
        assert!(matches!(
            poll.set_option("r", ""),
            Err(PollError::InvalidArgument { field: "text" })
        ));
        assert!(poll.is_empty());
    }

    #[test]
    fn set_option_redefines_existing_id() {
        let mut poll = colors();
        poll.vote("r");
        poll.set_option("r", "Crimson").unwrap();

        let options: Vec<(&str, &str, u64)> = poll
            .options()
            .map(|(o, votes)| (o.id(), o.text(), votes))
            .collect();
        assert_eq!(
            options,
            vec![("r", "Crimson", 1), ("g", "Green", 0), ("b", "Blue", 0)]
        );
        assert_eq!(poll.vote_count(), 1);
    }

    #[test]
    fn vote_count_matches_accepted_votes() {
        let mut poll = colors();
        let tokens = ["g", "r", "G", "", "g", "red", "b"];
        let accepted = tokens.iter().filter(|t| poll.vote(t).is_some()).count();
        assert_eq!(accepted, 4);
        assert_eq!(poll.vote_count(), 4);
        assert_eq!(poll.votes_for("g"), Some(2));
        assert_eq!(poll.votes_for("G"), None);
    }

    #[test]
    fn vote_returns_matched_option() {
        let mut poll = colors();
        let chosen = poll.vote("b").unwrap();
        assert_eq!(chosen.id(), "b");
        assert_eq!(chosen.text(), "Blue");
    }

    #[test]
    fn ties_keep_authoring_order() {
        let mut poll = Poll::new("q").unwrap();
        poll.set_option("o1", "First").unwrap();
        poll.set_option("o2", "Second").unwrap();
        poll.set_option("o3", "Third").unwrap();
        poll.vote("o3");

        let scores = poll.calculate_scores();
        let ids: Vec<&str> = scores.iter().map(|s| s.option.id()).collect();
        assert_eq!(ids, vec!["o3", "o1", "o2"]);
    }

    #[test]
    fn best_color_scenario() {
        let mut poll = colors();
        for token in ["g", "r", "g", "z"] {
            poll.vote(token);
        }
        assert_eq!(poll.vote_count(), 3);
        assert_eq!(
            rows(&poll.calculate_scores()),
            vec![("g", "Green", 2), ("r", "Red", 1), ("b", "Blue", 0)]
        );
    }

    #[test]
    fn full_tally_rejects_further_votes() {
        let mut bytes: Vec<u8> = vec![1, b'q', 1, 0, 0, 0, 1, b'a', 1, b'A'];
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        let mut poll = store::from_bytes(&bytes).unwrap();
        let before = poll.clone();

        assert!(poll.vote("a").is_none());
        assert_eq!(poll, before);
        assert_eq!(poll.vote_count(), u64::MAX);
        assert_eq!(poll.votes_for("a"), Some(u64::MAX));
    }

    #[test]
    fn empty_poll_has_no_scores() {
        let mut poll = Poll::new("q").unwrap();
        assert!(poll.vote("x").is_none());
        assert!(poll.calculate_scores().is_empty());
    }

    #[test]
    fn formatted_poll_lists_options_in_order() {
        let mut poll = colors();
        poll.vote("b");
        assert_eq!(
            poll.formatted_question_and_options(),
            "Best color?\n\nr - Red\ng - Green\nb - Blue"
        );
    }

    #[test]
    fn structural_equality_compares_text() {
        let a = colors();
        let mut b = colors();
        assert_eq!(a, b);
        b.set_option("g", "Lime").unwrap();
        assert_ne!(a, b);
    }
}
