use lazy_static::lazy_static;
use regex::Regex;

use crate::prelude::*;

lazy_static! {
	// Email regex: https://stackoverflow.com/a/201378
	#[allow(clippy::unwrap_used)]
	static ref EMAIL_REGEX: Regex = Regex::new("(?i)^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*|\"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]|\\\\[\x01-\x09\x0b\x0c\x0e-\x7f])*\")@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?|\\[(?:(?:(2(5[0-5]|[0-4][0-9])|1[0-9][0-9]|[1-9]?[0-9]))\\.){3}(?:(2(5[0-5]|[0-4][0-9])|1[0-9][0-9]|[1-9]?[0-9])|[a-z0-9-]*[a-z0-9]:(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]|\\\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\\])$").unwrap();
}

pub fn is_email_valid(email: &str) -> bool {
	email.len() <= 320 && EMAIL_REGEX.is_match(email)
}

/// Checks the length of a chirp and masks any profane words in it. Returns
/// `None` if the chirp is too long. Words are separated by single spaces and
/// compared case-insensitively, so `Kerfuffle!` is left as is.
pub fn clean_chirp_body(body: &str) -> Option<String> {
	if body.len() > constants::MAX_CHIRP_LENGTH {
		return None;
	}

	Some(
		body.split(' ')
			.map(|word| {
				if constants::PROFANE_WORDS.contains(&word.to_lowercase().as_str()) {
					constants::PROFANITY_MASK
				} else {
					word
				}
			})
			.collect::<Vec<_>>()
			.join(" "),
	)
}
