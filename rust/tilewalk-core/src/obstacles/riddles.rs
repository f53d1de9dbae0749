use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// One riddle-door question, recognised by a fragment of its text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Riddle {
    pub question: String,
    pub answer: String,
}

/// Answers for the security riddle doors, matched case-insensitively against the dialogue text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiddleBook {
    riddles: Vec<Riddle>,
}

const BUILTIN: &[(&str, &str)] = &[
    ("who is it ok to share my account with", "Nobody."),
    ("who can i give my password to", "Nobody."),
    ("is it ok to buy an account", "No, you should never buy an account."),
    ("where should i enter my password", "Only on the official website."),
    ("should i leave my account logged in", "No."),
    ("a website claims it can give you free membership", "Nobody can give you free membership."),
    ("what do i do if a moderator asks me for my account details", "Politely tell them no and then use the 'Report Abuse' button."),
    ("what is the best way to secure my account", "Authenticator and two-step login on my registered email."),
    ("my friend asks me for my password", "Don't give them the information and send an 'Abuse Report'."),
    ("what should you do if another player messages you recommending a website", "Report the player for phishing."),
    ("how do i set a bank pin", "Talk to any banker."),
    ("what do you do if someone asks you for your password or bank pin", "Don't tell them anything and click the 'Report Abuse' button."),
    ("who can i give my bank pin to", "Nobody."),
    ("is it ok to use a password from another website", "No, you should use a unique password."),
    ("can i leave my account logged in while i'm out of the room", "No."),
];

impl Default for RiddleBook {
    fn default() -> Self {
        Self {
            riddles: BUILTIN
                .iter()
                .map(|(q, a)| Riddle { question: q.to_string(), answer: a.to_string() })
                .collect(),
        }
    }
}

impl RiddleBook {
    pub fn new(riddles: Vec<Riddle>) -> Self {
        Self { riddles }
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn len(&self) -> usize {
        self.riddles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.riddles.is_empty()
    }

    /// Answer whose question fragment appears in `text`. Markup line breaks are treated as spaces.
    pub fn answer_for(&self, text: &str) -> Option<&str> {
        let normalized = text.replace("<br>", " ").to_ascii_lowercase();
        self.riddles
            .iter()
            .find(|r| normalized.contains(&r.question.to_ascii_lowercase()))
            .map(|r| r.answer.as_str())
    }
}
