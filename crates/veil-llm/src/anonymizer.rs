//! PII detection and reversible anonymization for outbound prompts.
//!
//! Detection runs an ordered list of pattern classes over the text. A span
//! claimed by an earlier class is never reconsidered by a later one, which is
//! how a 12-digit national ID wins over the generic account-number class and
//! an `+7` mobile number wins over both.
//!
//! ```text
//! IBAN → email → card → SSN → phone → passport → national ID
//!      → account number → address → person name
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::Range;

/// Detects PII and swaps it for `[KIND_n]` placeholders.
///
/// The anonymizer holds only compiled patterns. Placeholder counters live on
/// the stack of each [`anonymize`](Self::anonymize) call, so one instance can
/// be shared freely between concurrent tasks.
#[derive(Debug, Clone)]
pub struct PiiAnonymizer {
    patterns: Vec<PiiPattern>,
}

impl Default for PiiAnonymizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PiiAnonymizer {
    /// Create an anonymizer with the default pattern classes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }

    /// Find every PII span in `text`, ordered by position.
    ///
    /// Placeholders on the returned detections are the ones
    /// [`anonymize`](Self::anonymize) would substitute.
    #[must_use]
    pub fn detect(&self, text: &str) -> Vec<DetectedPii> {
        self.detect_numbered(text, &mut Numbering::default())
    }

    /// Replace every detected span with its placeholder.
    ///
    /// Repeated occurrences of the same value share one placeholder.
    #[must_use]
    pub fn anonymize(&self, text: &str) -> AnonymizationResult {
        let detected = self.detect(text);
        substitute(text, detected)
    }

    /// Anonymize several texts under one placeholder numbering.
    ///
    /// A value appearing in more than one text gets the same placeholder
    /// everywhere, so the mappings of the results never disagree and can be
    /// merged.
    #[must_use]
    pub fn anonymize_all(&self, texts: &[&str]) -> Vec<AnonymizationResult> {
        let mut numbering = Numbering::default();
        texts
            .iter()
            .map(|text| substitute(text, self.detect_numbered(text, &mut numbering)))
            .collect()
    }

    /// Put original values back in place of their placeholders.
    ///
    /// Placeholders are bracketed and never substrings of one another, so
    /// the iteration order of `mapping` does not affect the result.
    #[must_use]
    pub fn deanonymize(&self, text: &str, mapping: &HashMap<String, String>) -> String {
        if mapping.is_empty() {
            return text.to_string();
        }

        let mut result = text.to_string();
        for (placeholder, original) in mapping {
            if result.contains(placeholder.as_str()) {
                result = result.replace(placeholder.as_str(), original);
            }
        }
        result
    }

    fn detect_numbered(&self, text: &str, numbering: &mut Numbering) -> Vec<DetectedPii> {
        self.scan(text)
            .into_iter()
            .map(|(kind, span)| {
                let original = &text[span.clone()];
                DetectedPii {
                    kind,
                    original: original.to_string(),
                    placeholder: numbering.placeholder(kind, original),
                    span,
                }
            })
            .collect()
    }

    /// Run every class in order, returning unclaimed, non-skipped spans by position.
    fn scan(&self, text: &str) -> Vec<(PiiKind, Range<usize>)> {
        let mut found: Vec<(PiiKind, Range<usize>)> = Vec::new();

        for pattern in &self.patterns {
            for matched in pattern.regex.find_iter(text) {
                let span = matched.range();
                if span.is_empty() || found.iter().any(|(_, claimed)| overlaps(claimed, &span)) {
                    continue;
                }
                if pattern.skip.iter().any(|rule| rule.applies(text, &span)) {
                    continue;
                }
                found.push((pattern.kind, span));
            }
        }

        found.sort_by_key(|(_, span)| span.start);
        found
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Per-kind placeholder counters for one anonymization pass.
#[derive(Default)]
struct Numbering {
    counters: HashMap<PiiKind, usize>,
    assigned: HashMap<(PiiKind, String), String>,
}

impl Numbering {
    fn placeholder(&mut self, kind: PiiKind, original: &str) -> String {
        let counters = &mut self.counters;
        self.assigned
            .entry((kind, original.to_string()))
            .or_insert_with(|| {
                let counter = counters.entry(kind).or_insert(0);
                *counter += 1;
                kind.placeholder(*counter)
            })
            .clone()
    }
}

fn substitute(text: &str, detected: Vec<DetectedPii>) -> AnonymizationResult {
    if detected.is_empty() {
        return AnonymizationResult {
            text: text.to_string(),
            mapping: HashMap::new(),
            detected,
            was_modified: false,
        };
    }

    let mut anonymized = String::with_capacity(text.len());
    let mut mapping = HashMap::new();
    let mut cursor = 0;

    for detection in &detected {
        anonymized.push_str(&text[cursor..detection.span.start]);
        anonymized.push_str(&detection.placeholder);
        mapping.insert(detection.placeholder.clone(), detection.original.clone());
        cursor = detection.span.end;
    }
    anonymized.push_str(&text[cursor..]);

    tracing::debug!(
        "Anonymized {} PII spans into {} placeholders",
        detected.len(),
        mapping.len()
    );

    AnonymizationResult {
        text: anonymized,
        mapping,
        detected,
        was_modified: true,
    }
}

/// Output of [`PiiAnonymizer::anonymize`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnonymizationResult {
    /// Text with every detection replaced by its placeholder
    pub text: String,

    /// Placeholder → original value
    pub mapping: HashMap<String, String>,

    /// Every detection, in text order
    pub detected: Vec<DetectedPii>,

    /// Whether any replacement was made
    pub was_modified: bool,
}

impl AnonymizationResult {
    /// Check if any PII was detected.
    #[must_use]
    pub fn has_pii(&self) -> bool {
        !self.detected.is_empty()
    }

    /// Get the count of detected PII spans.
    #[must_use]
    pub fn pii_count(&self) -> usize {
        self.detected.len()
    }
}

/// A detected instance of PII.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedPii {
    /// Class of PII
    pub kind: PiiKind,

    /// The matched substring
    pub original: String,

    /// Placeholder that replaces it, e.g. `[PHONE_1]`
    pub placeholder: String,

    /// Byte offsets of the match in the source text
    pub span: Range<usize>,
}

/// Kinds of PII the anonymizer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PiiKind {
    /// Personal name
    PersonName,
    /// International bank account number
    Iban,
    /// Generic 10-20 digit account number
    AccountNumber,
    /// 16-digit payment card number
    CardNumber,
    /// Phone number
    Phone,
    /// Email address
    Email,
    /// Street address
    Address,
    /// US Social Security Number
    Ssn,
    /// Passport number
    Passport,
    /// 12-digit national identification number
    NationalId,
}

impl PiiKind {
    /// Get the string representation used in placeholders.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersonName => "PERSON_NAME",
            Self::Iban => "IBAN",
            Self::AccountNumber => "ACCOUNT_NUMBER",
            Self::CardNumber => "CARD_NUMBER",
            Self::Phone => "PHONE",
            Self::Email => "EMAIL",
            Self::Address => "ADDRESS",
            Self::Ssn => "SSN",
            Self::Passport => "PASSPORT",
            Self::NationalId => "NATIONAL_ID",
        }
    }

    /// Placeholder for the `n`-th distinct value of this kind.
    #[must_use]
    pub fn placeholder(&self, n: usize) -> String {
        format!("[{}_{n}]", self.as_str())
    }
}

/// False-positive filters attached to a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipRule {
    /// The match is a calendar date
    Date,
    /// The match is part of a decimal amount
    Amount,
    /// The match contains merchant or business vocabulary
    BusinessVocabulary,
}

impl SkipRule {
    fn applies(self, text: &str, span: &Range<usize>) -> bool {
        let matched = &text[span.clone()];
        match self {
            Self::Date => DATE_REGEX.is_match(matched.trim()),
            Self::Amount => {
                if AMOUNT_REGEX.is_match(matched.trim()) {
                    return true;
                }
                // A fractional part right after the match means we only caught
                // the integer half of an amount.
                let mut rest = text[span.end..].chars();
                matches!(
                    (rest.next(), rest.next()),
                    (Some('.' | ','), Some(digit)) if digit.is_ascii_digit()
                )
            }
            Self::BusinessVocabulary => matched
                .split(|c: char| !c.is_alphanumeric())
                .filter(|word| !word.is_empty())
                .any(|word| BUSINESS_VOCABULARY.contains(word.to_lowercase().as_str())),
        }
    }
}

/// A PII detection pattern.
#[derive(Clone)]
struct PiiPattern {
    kind: PiiKind,
    regex: Regex,
    skip: &'static [SkipRule],
}

impl std::fmt::Debug for PiiPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiiPattern")
            .field("kind", &self.kind)
            .field("regex", &self.regex.as_str())
            .field("skip", &self.skip)
            .finish()
    }
}

impl PiiPattern {
    fn new(kind: PiiKind, regex: &Lazy<Regex>, skip: &'static [SkipRule]) -> Self {
        Self {
            kind,
            regex: Regex::clone(regex),
            skip,
        }
    }
}

/// Default pattern classes, most specific first. Order is significant.
fn default_patterns() -> Vec<PiiPattern> {
    use PiiKind as K;
    use SkipRule::{Amount, BusinessVocabulary, Date};

    vec![
        PiiPattern::new(K::Iban, &IBAN_REGEX, &[]),
        PiiPattern::new(K::Email, &EMAIL_REGEX, &[]),
        PiiPattern::new(K::CardNumber, &CARD_REGEX, &[Amount]),
        PiiPattern::new(K::Ssn, &SSN_REGEX, &[]),
        PiiPattern::new(K::Phone, &PHONE_CIS_REGEX, &[Date, Amount]),
        PiiPattern::new(K::Phone, &PHONE_INTL_REGEX, &[Date, Amount]),
        PiiPattern::new(K::Phone, &PHONE_US_REGEX, &[Date, Amount]),
        PiiPattern::new(K::Phone, &PHONE_LOCAL_REGEX, &[Date, Amount]),
        PiiPattern::new(K::Passport, &PASSPORT_REGEX, &[]),
        // IDs and account numbers are never decimal, so no amount check
        PiiPattern::new(K::NationalId, &NATIONAL_ID_REGEX, &[]),
        PiiPattern::new(K::AccountNumber, &ACCOUNT_REGEX, &[]),
        PiiPattern::new(K::Address, &ADDRESS_CYRILLIC_REGEX, &[]),
        PiiPattern::new(K::Address, &ADDRESS_LATIN_REGEX, &[]),
        // Names last: they are the most prone to false positives
        PiiPattern::new(K::PersonName, &NAME_CYR_SURNAME_INITIALS_REGEX, &[BusinessVocabulary]),
        PiiPattern::new(K::PersonName, &NAME_CYR_INITIALS_SURNAME_REGEX, &[BusinessVocabulary]),
        PiiPattern::new(K::PersonName, &NAME_CYR_PATRONYMIC_REGEX, &[BusinessVocabulary]),
        PiiPattern::new(K::PersonName, &NAME_CYR_SURNAME_FIRST_REGEX, &[BusinessVocabulary]),
        PiiPattern::new(K::PersonName, &NAME_LATIN_FULL_REGEX, &[BusinessVocabulary]),
        PiiPattern::new(K::PersonName, &NAME_LATIN_INITIAL_REGEX, &[BusinessVocabulary]),
    ]
}

// Compiled regex patterns

// Compact KZ86125KZT5004100100, or grouped KZ86 125K ZT50 0410 0100.
// In the grouped form the closing group must hold a digit, so a trailing
// currency code or other capitalized word is never absorbed.
static IBAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b[A-Z]{2}[0-9]{2}(?:[A-Z0-9]{11,30}",
        r"|(?: [A-Z0-9]{4}){1,6} (?:[0-9][A-Z0-9]{3}|[A-Z][0-9][A-Z0-9]{2}|[A-Z]{2}[0-9][A-Z0-9]|[A-Z]{3}[0-9])",
        r"(?: (?:[0-9][A-Z0-9]{0,2}|[A-Z][0-9][A-Z0-9]?|[A-Z]{2}[0-9]))?)\b",
    ))
    .expect("valid IBAN regex")
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

static CARD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{4}(?:[ -]?[0-9]{4}){3}\b").expect("valid card regex"));

static SSN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{3}-[0-9]{2}-[0-9]{4}\b").expect("valid SSN regex"));

// +7 701 123 45 67, 8 (701) 123-45-67
static PHONE_CIS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\+7|\b8)[ \t-]?\(?[0-9]{3}\)?[ \t-]?[0-9]{3}[ \t-]?[0-9]{2}[ \t-]?[0-9]{2}\b",
    )
    .expect("valid CIS phone regex")
});

// +44 20 7946 0958, +1 555 123 4567, +33 1 23 45 67 89; at most 15 digits.
// A number ends at its 4-digit subscriber group or its last digit pair.
static PHONE_INTL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\+[1-9][0-9]{0,2}(?:(?:[ -]?[0-9]{2,4}){0,2}[ -]?[0-9]{4}",
        r"|[ -]?[0-9]{1,3}(?:[ -][0-9]{2}){3,4})\b",
    ))
    .expect("valid international phone regex")
});

// (555) 123-4567, 555.123.4567
static PHONE_US_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\([0-9]{3}\)[ ]?[0-9]{3}[-. ]?|\b[0-9]{3}[-.][0-9]{3}[-.])[0-9]{4}\b")
        .expect("valid US phone regex")
});

// 123-45-67 city numbers; also catches dd.mm.yyyy, hence the date skip
static PHONE_LOCAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9]{2,3}[-.][0-9]{2}[-.][0-9]{2,4}\b").expect("valid local phone regex")
});

static PASSPORT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{1,2}[0-9]{7,8}\b").expect("valid passport regex"));

static NATIONAL_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{12}\b").expect("valid national ID regex"));

static ACCOUNT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{10,20}\b").expect("valid account number regex"));

static ADDRESS_CYRILLIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:ул\.|улица|пр\.|пр-т|проспект|мкр\.?|микрорайон|пер\.|переулок|бульвар|б-р)[ \t]*\p{L}[\p{L}0-9-]+(?:[ \t]\p{L}[\p{L}0-9-]+)?(?:,?[ \t]*(?:д\.|дом)?[ \t]*[0-9]+\p{L}?(?:/[0-9]+)?)?(?:,?[ \t]*(?:кв\.|квартира)[ \t]*[0-9]+)?",
    )
    .expect("valid Cyrillic address regex")
});

static ADDRESS_LATIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b[0-9]{1,5}[ \t]+(?:[A-Z][a-z]+[ \t]+){1,3}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl)\b\.?(?:,?[ \t]*(?:Apt|Suite|Unit)\.?[ \t]*[0-9A-Za-z]+)?",
    )
    .expect("valid Latin address regex")
});

// Иванов И.И.
static NAME_CYR_SURNAME_INITIALS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b[А-ЯЁӘҒҚҢӨҰҮҺІ][а-яёәғқңөұүһі]+(?:-[А-ЯЁӘҒҚҢӨҰҮҺІ][а-яёәғқңөұүһі]+)?[ \t]+[А-ЯЁӘҒҚҢӨҰҮҺІ]\.(?:[ \t]?[А-ЯЁӘҒҚҢӨҰҮҺІ]\.)?",
    )
    .expect("valid Cyrillic surname-initials regex")
});

// И.И. Иванов
static NAME_CYR_INITIALS_SURNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b[А-ЯЁӘҒҚҢӨҰҮҺІ]\.[ \t]?(?:[А-ЯЁӘҒҚҢӨҰҮҺІ]\.[ \t]?)?[А-ЯЁӘҒҚҢӨҰҮҺІ][а-яёәғқңөұүһі]+(?:-[А-ЯЁӘҒҚҢӨҰҮҺІ][а-яёәғқңөұүһі]+)?\b",
    )
    .expect("valid Cyrillic initials-surname regex")
});

// Иванов Иван Иванович
static NAME_CYR_PATRONYMIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b[А-ЯЁӘҒҚҢӨҰҮҺІ][а-яёәғқңөұүһі]+[ \t]+[А-ЯЁӘҒҚҢӨҰҮҺІ][а-яёәғқңөұүһі]+[ \t]+[А-ЯЁӘҒҚҢӨҰҮҺІ][а-яёәғқңөұүһі]+(?:вич|вна|ична|чна|оглы|кызы|улы|ұлы|қызы)\b",
    )
    .expect("valid Cyrillic patronymic regex")
});

// Петров Сергей; the surname must carry a typical surname ending
static NAME_CYR_SURNAME_FIRST_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b[А-ЯЁӘҒҚҢӨҰҮҺІ][а-яёәғқңөұүһі]*(?:ов|ев|ёв|ин|ын|ий|ой|ова|ева|ёва|ина|ына|ская|цкая|ко|ук|юк|ян|швили|дзе)[ \t]+[А-ЯЁӘҒҚҢӨҰҮҺІ][а-яёәғқңөұүһі]+\b",
    )
    .expect("valid Cyrillic surname-firstname regex")
});

// John Smith, John A. Smith, Mary Smith-Jones
static NAME_LATIN_FULL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:[ \t]+[A-Z]\.)?[ \t]+[A-Z][a-z]+(?:-[A-Z][a-z]+)?\b")
        .expect("valid Latin name regex")
});

// J. Smith
static NAME_LATIN_INITIAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z]\.[ \t]?[A-Z][a-z]+\b").expect("valid Latin initial-name regex")
});

static DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9]{1,2}[./-][0-9]{1,2}[./-][0-9]{2,4}|[0-9]{4}[./-][0-9]{1,2}[./-][0-9]{1,2})$")
        .expect("valid date regex")
});

static AMOUNT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+[.,][0-9]+$").expect("valid amount regex"));

/// Lowercased words that mark a capitalized phrase as a merchant, not a person.
static BUSINESS_VOCABULARY: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Latin
        "bank", "store", "shop", "market", "supermarket", "mart", "ltd", "llc", "inc", "corp",
        "company", "express", "group", "service", "services", "pay", "payment", "payments",
        "transfer", "cafe", "coffee", "restaurant", "pizza", "pharmacy", "online", "mobile",
        "gold", "plus", "international", "holding", "center", "centre", "station", "airlines",
        "taxi", "delivery", "fitness", "club", "hotel", "travel", "insurance", "capital",
        "finance", "credit", "card", "visa", "mastercard", "wallet", "kaspi", "halyk",
        // Cyrillic
        "банк", "магазин", "маркет", "супермаркет", "тоо", "ооо", "ао", "ип", "экспресс",
        "сервис", "аптека", "кафе", "ресторан", "перевод", "оплата", "платеж", "платёж",
        "пополнение", "снятие", "кредит", "депозит", "карта", "каспи", "халык", "сбербанк",
        "торговый", "центр", "такси", "доставка", "азс", "отель", "гостиница", "клиника",
        "компания", "группа", "холдинг",
    ]
    .into_iter()
    .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<PiiKind> {
        PiiAnonymizer::new()
            .detect(text)
            .iter()
            .map(|d| d.kind)
            .collect()
    }

    #[test]
    fn test_email_detection() {
        let result = PiiAnonymizer::new().anonymize("Contact me at john.doe@example.com");

        assert!(result.has_pii());
        assert_eq!(result.pii_count(), 1);
        assert_eq!(result.detected[0].kind, PiiKind::Email);
        assert_eq!(result.text, "Contact me at [EMAIL_1]");
    }

    #[test]
    fn test_phone_and_national_id_precedence() {
        let anonymizer = PiiAnonymizer::new();
        let text = "тел +77011234567, ИИН 123456789012";
        let result = anonymizer.anonymize(text);

        let found: Vec<(PiiKind, &str)> = result
            .detected
            .iter()
            .map(|d| (d.kind, d.original.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (PiiKind::Phone, "+77011234567"),
                (PiiKind::NationalId, "123456789012"),
            ]
        );
        assert_eq!(result.text, "тел [PHONE_1], ИИН [NATIONAL_ID_1]");
        assert_eq!(anonymizer.deanonymize(&result.text, &result.mapping), text);
    }

    #[test]
    fn test_account_number_fallback() {
        assert_eq!(kinds("счет 12345678901"), vec![PiiKind::AccountNumber]);
        assert_eq!(kinds("acct 12345678901234567890"), vec![PiiKind::AccountNumber]);
        // Nine digits is below the account threshold
        assert!(kinds("ref 123456789").is_empty());
    }

    #[test]
    fn test_card_beats_account() {
        assert_eq!(kinds("card 4400430212345678"), vec![PiiKind::CardNumber]);
        assert_eq!(kinds("card 4400 4302 1234 5678"), vec![PiiKind::CardNumber]);
    }

    #[test]
    fn test_iban_detection() {
        let result = PiiAnonymizer::new().anonymize("IBAN KZ86125KZT5004100100 для перевода");
        assert_eq!(result.detected[0].kind, PiiKind::Iban);
        assert_eq!(result.detected[0].original, "KZ86125KZT5004100100");
        assert_eq!(result.text, "IBAN [IBAN_1] для перевода");
    }

    #[test]
    fn test_grouped_iban_stops_before_currency() {
        let result = PiiAnonymizer::new().anonymize("IBAN KZ86 1251 2345 6789 0123 USD today");
        assert_eq!(result.detected.len(), 1);
        assert_eq!(result.detected[0].kind, PiiKind::Iban);
        assert_eq!(result.detected[0].original, "KZ86 1251 2345 6789 0123");
        assert_eq!(result.text, "IBAN [IBAN_1] USD today");

        let result = PiiAnonymizer::new().anonymize("GB29 NWBK 6016 1331 9268 19 is mine");
        assert_eq!(result.detected[0].original, "GB29 NWBK 6016 1331 9268 19");
        assert_eq!(result.text, "[IBAN_1] is mine");
    }

    #[test]
    fn test_ssn_and_passport() {
        assert_eq!(kinds("SSN: 123-45-6789"), vec![PiiKind::Ssn]);
        assert_eq!(kinds("passport N12345678"), vec![PiiKind::Passport]);
    }

    #[test]
    fn test_phone_formats() {
        assert_eq!(kinds("Call me at (555) 123-4567"), vec![PiiKind::Phone]);
        assert_eq!(kinds("звоните 8 (701) 123-45-67"), vec![PiiKind::Phone]);
        assert_eq!(kinds("office +44 20 7946 0958"), vec![PiiKind::Phone]);
        assert_eq!(kinds("городской 273-45-67"), vec![PiiKind::Phone]);
    }

    #[test]
    fn test_phone_leaves_trailing_number() {
        let result = PiiAnonymizer::new().anonymize("Call +1 555 123 4567 10 times");
        assert_eq!(result.detected.len(), 1);
        assert_eq!(result.detected[0].original, "+1 555 123 4567");
        assert_eq!(result.text, "Call [PHONE_1] 10 times");

        assert_eq!(kinds("+33 1 23 45 67 89 bonjour"), vec![PiiKind::Phone]);
    }

    #[test]
    fn test_space_separated_numbers_are_not_a_phone() {
        let result = PiiAnonymizer::new().anonymize("price 100 200 3000");
        assert!(result.detected.is_empty());
        assert_eq!(result.text, "price 100 200 3000");

        assert_eq!(
            kinds("(555) 123-4567 and 555.123.4567 and 555-123-4567"),
            vec![PiiKind::Phone, PiiKind::Phone, PiiKind::Phone]
        );
    }

    #[test]
    fn test_date_is_not_a_phone() {
        assert!(kinds("оплачено 12.03.2024").is_empty());
        assert!(kinds("due 05-11-2025").is_empty());
    }

    #[test]
    fn test_amount_is_not_a_phone() {
        assert!(kinds("balance +12345678.90").is_empty());
    }

    #[test]
    fn test_address_detection() {
        let result = PiiAnonymizer::new().anonymize("Живу: ул. Абая, д. 10, кв. 5, Алматы");
        assert_eq!(result.detected[0].kind, PiiKind::Address);
        assert_eq!(result.detected[0].original, "ул. Абая, д. 10, кв. 5");

        assert_eq!(kinds("Ship to 221 Baker Street today"), vec![PiiKind::Address]);
    }

    #[test]
    fn test_cyrillic_names() {
        assert_eq!(kinds("Получатель Иванов И.И."), vec![PiiKind::PersonName]);
        assert_eq!(kinds("подписал И.И. Иванов"), vec![PiiKind::PersonName]);

        let result = PiiAnonymizer::new().anonymize("от Сидоров Пётр Алексеевич");
        assert_eq!(result.detected[0].original, "Сидоров Пётр Алексеевич");
        assert_eq!(result.text, "от [PERSON_NAME_1]");

        let result = PiiAnonymizer::new().anonymize("Клиент Петров Сергей оплатил");
        assert_eq!(result.detected[0].original, "Петров Сергей");
    }

    #[test]
    fn test_latin_names() {
        let result = PiiAnonymizer::new().anonymize("Please send it to John Smith today");
        assert_eq!(result.text, "Please send it to [PERSON_NAME_1] today");
        assert_eq!(kinds("signed J. Smith"), vec![PiiKind::PersonName]);
    }

    #[test]
    fn test_business_vocabulary_is_not_a_name() {
        assert!(kinds("Payment to Kaspi Bank").is_empty());
        assert!(kinds("покупка Магазин Технодом").is_empty());
        assert!(kinds("order from Magnum Express").is_empty());
    }

    #[test]
    fn test_names_do_not_span_lines() {
        let result = PiiAnonymizer::new().anonymize("Thanks\nJohn");
        assert!(result.detected.is_empty());
        assert_eq!(result.text, "Thanks\nJohn");

        assert!(kinds("Иванов\nИван").is_empty());
    }

    #[test]
    fn test_placeholder_numbering_per_kind() {
        let result = PiiAnonymizer::new()
            .anonymize("a@example.com, +77011234567, b@example.com, +77017654321");

        assert_eq!(
            result.text,
            "[EMAIL_1], [PHONE_1], [EMAIL_2], [PHONE_2]"
        );
        assert_eq!(result.mapping.len(), 4);
        assert_eq!(result.mapping["[EMAIL_2]"], "b@example.com");
    }

    #[test]
    fn test_repeated_value_reuses_placeholder() {
        let result =
            PiiAnonymizer::new().anonymize("a@example.com wrote to a@example.com");
        assert_eq!(result.text, "[EMAIL_1] wrote to [EMAIL_1]");
        assert_eq!(result.mapping.len(), 1);
        assert_eq!(result.pii_count(), 2);
    }

    #[test]
    fn test_anonymize_all_shares_numbering() {
        let results = PiiAnonymizer::new().anonymize_all(&[
            "Reply to a@example.com",
            "You assist a@example.com and b@example.com",
        ]);

        assert_eq!(results[0].text, "Reply to [EMAIL_1]");
        assert_eq!(results[1].text, "You assist [EMAIL_1] and [EMAIL_2]");
        assert_eq!(results[1].mapping["[EMAIL_2]"], "b@example.com");
    }

    #[test]
    fn test_round_trip() {
        let anonymizer = PiiAnonymizer::new();
        let texts = [
            "Перевод Иванов И.И. на карту 4400 4302 1234 5678, тел +7 701 123 45 67",
            "John Smith (john@example.com) lives at 12 Oak Lane, SSN 123-45-6789",
            "IBAN KZ86125KZT5004100100, ИИН 990101300123, счет 00112233445566",
            "",
            "no personal data here at all",
        ];

        for text in texts {
            let result = anonymizer.anonymize(text);
            assert_eq!(anonymizer.deanonymize(&result.text, &result.mapping), text);
        }
    }

    #[test]
    fn test_no_pii_is_unchanged() {
        let result = PiiAnonymizer::new().anonymize("this is a normal message with no pii");

        assert!(!result.was_modified);
        assert!(!result.has_pii());
        assert!(result.mapping.is_empty());
        assert_eq!(result.text, "this is a normal message with no pii");
    }

    #[test]
    fn test_empty_input() {
        let result = PiiAnonymizer::new().anonymize("");
        assert!(!result.was_modified);
        assert_eq!(result.text, "");
    }

    #[test]
    fn test_deanonymize_without_mapping() {
        let anonymizer = PiiAnonymizer::new();
        let empty = HashMap::new();
        assert_eq!(anonymizer.deanonymize("[PHONE_1] stays", &empty), "[PHONE_1] stays");

        let mut mapping = HashMap::new();
        mapping.insert("[PHONE_1]".to_string(), "+77011234567".to_string());
        assert_eq!(anonymizer.deanonymize("plain text", &mapping), "plain text");
    }

    #[test]
    fn test_placeholders_are_not_nested() {
        // [PHONE_1] must not be rewritten inside [PHONE_10]
        let mut mapping = HashMap::new();
        mapping.insert("[PHONE_1]".to_string(), "one".to_string());
        mapping.insert("[PHONE_10]".to_string(), "ten".to_string());

        let restored = PiiAnonymizer::new().deanonymize("[PHONE_10] and [PHONE_1]", &mapping);
        assert_eq!(restored, "ten and one");
    }

    #[test]
    fn test_spans_point_at_originals() {
        let text = "тел +77011234567";
        for detection in PiiAnonymizer::new().detect(text) {
            assert_eq!(&text[detection.span.clone()], detection.original);
        }
    }

    #[test]
    fn test_concurrent_calls_number_independently() {
        let anonymizer = PiiAnonymizer::new();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let anonymizer = &anonymizer;
                    scope.spawn(move || {
                        anonymizer.anonymize(&format!("user{i}@example.com and other{i}@example.com"))
                    })
                })
                .collect();

            for handle in handles {
                let result = handle.join().expect("thread panicked");
                assert_eq!(result.text, "[EMAIL_1] and [EMAIL_2]");
            }
        });
    }
}
