// 💬 Quick Answers - session shortcut for the chat assistant
// Simple questions about a reading are answered straight from the reading.
// None means "not a question we recognize": the caller falls back to the
// language-model path.

use crate::card::Card;
use crate::forecast::PeriodSlot;
use crate::reading::CardReading;

/// QuestionKind - what a recognized question is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    BirthCard,
    CurrentPeriod,
    Slot(PeriodSlot),
    Age,
}

/// Lowercase words of a question, split on anything not alphanumeric
fn words(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when `phrase` appears as consecutive whole words
fn has_phrase(words: &[String], phrase: &[&str]) -> bool {
    !phrase.is_empty()
        && words
            .windows(phrase.len())
            .any(|window| window.iter().zip(phrase).all(|(w, p)| w == p))
}

/// Classify a question by keyword rules, most specific first
///
/// Keywords match whole words only: "my agency" is not "my age".
pub fn classify_question(question: &str) -> Option<QuestionKind> {
    let words = words(question);
    if words.is_empty() {
        return None;
    }
    let has = |phrase: &[&str]| has_phrase(&words, phrase);

    if has(&["birth", "card"]) || has(&["birthcard"]) {
        return Some(QuestionKind::BirthCard);
    }

    let asks_period = has(&["current", "period"])
        || has(&["period", "am", "i", "in"])
        || has(&["period", "i", "m", "in"])
        || has(&["which", "period"])
        || has(&["what", "period"]);
    if asks_period {
        return Some(QuestionKind::CurrentPeriod);
    }

    // Slot names are ordinary words ("result", "mars"); only count them when
    // the question is clearly about a card or period
    let about_card = has(&["card"]) || has(&["cards"]) || has(&["period"]);
    if about_card {
        for slot in PeriodSlot::ALL {
            let label = slot.label().to_lowercase();
            let label_words: Vec<&str> = label.split_whitespace().collect();
            let name = slot.name().to_lowercase();
            if has(&label_words) || has(&[name.as_str()]) {
                return Some(QuestionKind::Slot(slot));
            }
        }
    }

    if has(&["how", "old"]) || has(&["my", "age"]) {
        return Some(QuestionKind::Age);
    }

    None
}

/// "King of Hearts (K♥)" for real cards, the raw token otherwise
pub fn describe_card(token: &str) -> String {
    match Card::parse(token) {
        Some(card) => format!("{} ({})", card.english_name(), card.token()),
        None => token.to_string(),
    }
}

/// Answer a question from the reading, or None to defer to the model
pub fn quick_answer(reading: &CardReading, question: &str) -> Option<String> {
    let answer = match classify_question(question)? {
        QuestionKind::BirthCard => {
            if reading.birth_card.is_unknown() {
                return None;
            }
            let mut text = format!(
                "Your birth card is the {}.",
                describe_card(&reading.birth_card.card)
            );
            if !reading.birth_card_activation.is_empty() {
                text.push(' ');
                text.push_str(&reading.birth_card_activation);
            }
            text
        }
        QuestionKind::CurrentPeriod => {
            let current = reading.enriched.current()?;
            let mut text = format!(
                "You are in your {} period, ruled by the {}",
                current.period_name.label(),
                describe_card(&current.card)
            );
            if let Some(started) = &current.formatted_start_date {
                text.push_str(&format!(", which began {}", started));
            }
            text.push('.');
            if !current.activation.is_empty() {
                text.push(' ');
                text.push_str(&current.activation);
            }
            text
        }
        QuestionKind::Slot(slot) => {
            if reading.forecast.is_blank() {
                return None;
            }
            let card = reading.forecast.get(slot);
            if card.is_empty() {
                format!(
                    "There is no {} card in your forecast at age {}.",
                    slot.label(),
                    reading.age
                )
            } else {
                format!(
                    "Your {} card at age {} is the {}.",
                    slot.label(),
                    reading.age,
                    describe_card(card)
                )
            }
        }
        QuestionKind::Age => format!("You are {} this year.", reading.age),
    };

    Some(answer)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::CardProfile;
    use crate::birth_card::BirthCard;
    use crate::forecast::ForecastRecord;
    use crate::periods::{EnrichedForecast, PlanetaryStartDates, ResolvedPeriod};
    use chrono::NaiveDate;

    fn reading() -> CardReading {
        let mut forecast = ForecastRecord::default();
        forecast.venus = "K♦".to_string();
        forecast.result = "10♣".to_string();

        let venus = ResolvedPeriod {
            period_name: PeriodSlot::Venus,
            card: "K♦".to_string(),
            is_planetary: true,
            is_strategic: false,
            start_date: Some("02/22".to_string()),
            formatted_start_date: Some("Feb 22 '25".to_string()),
            is_current: true,
            activation: "Put a price on your expertise.".to_string(),
        };

        CardReading {
            name: "Dana".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            age: 35,
            birth_card: BirthCard {
                card: "A♠".to_string(),
                name: "Ace of Spades".to_string(),
            },
            birth_card_activation: "Start the hidden project.".to_string(),
            birth_card_profile: CardProfile::default(),
            activations: forecast.map(|_, _| String::new()),
            forecast,
            enriched: EnrichedForecast {
                periods: vec![venus],
                current_period_name: Some(PeriodSlot::Venus),
                start_dates: PlanetaryStartDates::default(),
            },
        }
    }

    #[test]
    fn test_classify_question() {
        assert_eq!(classify_question("What's my birth card?"), Some(QuestionKind::BirthCard));
        assert_eq!(classify_question("what period am I in"), Some(QuestionKind::CurrentPeriod));
        assert_eq!(
            classify_question("What is my Venus card?"),
            Some(QuestionKind::Slot(PeriodSlot::Venus))
        );
        assert_eq!(
            classify_question("tell me about my long range card"),
            Some(QuestionKind::Slot(PeriodSlot::LongRange))
        );
        assert_eq!(classify_question("How old am I?"), Some(QuestionKind::Age));
    }

    #[test]
    fn test_ordinary_words_not_treated_as_slots() {
        assert_eq!(classify_question("How do I get better results with support staff?"), None);
        assert_eq!(classify_question("Write me a marketing plan"), None);
        assert_eq!(classify_question(""), None);
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        assert_eq!(classify_question("How do I grow my agency?"), None);
        assert_eq!(classify_question("Can you review my agenda?"), None);
        assert_eq!(classify_question("Should I hire my agent's referral?"), None);
        assert_eq!(classify_question("Who should marshal the launch team card deck?"), None);
        assert_eq!(classify_question("Is Mercury retrograde bad for launches?"), None);
        assert_eq!(classify_question("what is my age"), Some(QuestionKind::Age));
        assert_eq!(
            classify_question("what's my MARS card"),
            Some(QuestionKind::Slot(PeriodSlot::Mars))
        );
        assert_eq!(
            classify_question("what period i'm in?"),
            Some(QuestionKind::CurrentPeriod)
        );
    }

    #[test]
    fn test_business_questions_defer() {
        assert_eq!(quick_answer(&reading(), "How do I grow my agency?"), None);
        assert_eq!(quick_answer(&reading(), "Can you review my agenda?"), None);
    }

    #[test]
    fn test_answer_birth_card() {
        let answer = quick_answer(&reading(), "what's my birth card").unwrap();
        assert_eq!(
            answer,
            "Your birth card is the Ace of Spades (A♠). Start the hidden project."
        );
    }

    #[test]
    fn test_answer_current_period() {
        let answer = quick_answer(&reading(), "Which period am I in right now?").unwrap();
        assert_eq!(
            answer,
            "You are in your Venus period, ruled by the King of Diamonds (K♦), which began Feb 22 '25. Put a price on your expertise."
        );
    }

    #[test]
    fn test_answer_slot_and_empty_slot() {
        let answer = quick_answer(&reading(), "what is my result card?").unwrap();
        assert_eq!(answer, "Your Result card at age 35 is the Ten of Clubs (10♣).");

        let answer = quick_answer(&reading(), "what is my pluto card?").unwrap();
        assert_eq!(answer, "There is no Pluto card in your forecast at age 35.");
    }

    #[test]
    fn test_defers_when_reading_has_no_data() {
        let mut empty = reading();
        empty.birth_card = BirthCard::unknown();
        empty.forecast = ForecastRecord::default();
        empty.enriched.periods.clear();

        assert_eq!(quick_answer(&empty, "what's my birth card?"), None);
        assert_eq!(quick_answer(&empty, "what period am I in?"), None);
        assert_eq!(quick_answer(&empty, "my mars card?"), None);
        assert_eq!(quick_answer(&empty, "how old am I"), Some("You are 35 this year.".to_string()));
    }

    #[test]
    fn test_unrecognized_question_defers() {
        assert_eq!(quick_answer(&reading(), "How should I price my coaching offer?"), None);
    }
}
