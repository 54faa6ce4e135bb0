//! Phrase matching for Ba's spoken commands.
//!
//! Recognised text is matched against a fixed, insertion-ordered rule
//! table by case-insensitive substring containment. The first rule whose
//! trigger appears in the text wins; when nothing matches Mimu falls back
//! to a stock "I don't understand" reply. Lower-casing is the only
//! normalisation applied — Vietnamese diacritics are significant and
//! compared as-is.

/// One trigger/response pair. Triggers are stored lower-case.
pub struct PhraseRule {
    pub trigger: &'static str,
    pub response: &'static str,
}

/// The command table, evaluated top to bottom. Order is load-bearing:
/// overlapping triggers resolve to whichever rule appears first.
pub const PHRASE_RULES: &[PhraseRule] = &[
    PhraseRule {
        trigger: "mi nói chuyện",
        response: "Dạ chào ba, có chuyện gì không ạ?",
    },
    PhraseRule {
        trigger: "mi ăn cơm chưa",
        response: "Dạ chưa ba ơi, nấu cơm cho con đi nào!",
    },
    PhraseRule {
        trigger: "lẹ lẹ đi",
        response: "Ẹhh ba hối con gì đó, con làm lẹ mà!",
    },
];

/// Spoken when no rule matches.
pub const FALLBACK_RESPONSE: &str = "Dạ, con hông hiểu, ông nói lại đi ạ!";

/// Return the response of the first rule whose trigger is contained in the
/// lower-cased `text`, or `None` if no rule matches.
pub fn first_match<'a>(rules: &'a [PhraseRule], text: &str) -> Option<&'a str> {
    let lower = text.to_lowercase();
    rules
        .iter()
        .find(|rule| lower.contains(rule.trigger))
        .map(|rule| rule.response)
}

/// Map recognised text to exactly one response: the first matching rule's
/// response, or the fallback.
pub fn respond(text: &str) -> &'static str {
    first_match(PHRASE_RULES, text).unwrap_or(FALLBACK_RESPONSE)
}
