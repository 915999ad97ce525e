//! Field extraction rules for member pages.
//!
//! A rule pairs a destination in [`MemberProfile`] with a [`Locator`]. The
//! upstream markup keeps most values in the `<p>` that follows a labelled `<p>`,
//! so besides direct tag/attribute lookup there is a label-then-sibling lookup.
//! A handful of fields (club, name, birth, e-mail) need a composite rule.
//!
//! A missing node is never an error: the field stays `None`. A date that is
//! present but not `DD-MM-YYYY` is [`ScrapeError::MalformedDate`].

use crate::error::ScrapeError;
use crate::models::MemberProfile;
use chrono::NaiveDate;
use scraper::ElementRef;

const SOURCE_DATE_FORMAT: &str = "%d-%m-%Y";

// ── Locators ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum AttrMatch<'a> {
    Id(&'a str),
    Class(&'a str),
}

#[derive(Debug, Clone, Copy)]
pub enum LabelMatch<'a> {
    Id(&'a str),
    /// Label whose text contains this string.
    Text(&'a str),
}

#[derive(Debug, Clone, Copy)]
pub enum Locator<'a> {
    /// `<tag>` carrying the attribute.
    Direct { tag: &'a str, attr: AttrMatch<'a> },
    /// First `<tag>` sibling after the matching label `<tag>`.
    LabelSibling { tag: &'a str, label: LabelMatch<'a> },
}

impl<'a> Locator<'a> {
    pub const fn by_id(tag: &'a str, id: &'a str) -> Self {
        Self::Direct { tag, attr: AttrMatch::Id(id) }
    }

    pub const fn by_class(tag: &'a str, class: &'a str) -> Self {
        Self::Direct { tag, attr: AttrMatch::Class(class) }
    }

    pub const fn after_label_id(tag: &'a str, id: &'a str) -> Self {
        Self::LabelSibling { tag, label: LabelMatch::Id(id) }
    }

    pub const fn after_label_text(tag: &'a str, text: &'a str) -> Self {
        Self::LabelSibling { tag, label: LabelMatch::Text(text) }
    }

    pub fn locate<'d>(&self, root: ElementRef<'d>) -> Option<ElementRef<'d>> {
        match *self {
            Self::Direct { tag, attr } => find_element(root, tag, |el| attr.matches(el)),
            Self::LabelSibling { tag, label } => {
                let label_el = find_element(root, tag, |el| label.matches(el))?;
                next_sibling_tag(label_el, tag)
            }
        }
    }
}

impl AttrMatch<'_> {
    fn matches(&self, el: ElementRef<'_>) -> bool {
        match *self {
            Self::Id(id) => el.value().id() == Some(id),
            Self::Class(class) => el.value().classes().any(|c| c == class),
        }
    }
}

impl LabelMatch<'_> {
    fn matches(&self, el: ElementRef<'_>) -> bool {
        match *self {
            Self::Id(id) => el.value().id() == Some(id),
            Self::Text(needle) => element_text(el).contains(needle),
        }
    }
}

/// First descendant element of `root` (document order) named `tag` that satisfies `pred`.
pub fn find_element<'a>(
    root: ElementRef<'a>,
    tag: &str,
    pred: impl Fn(ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == tag && pred(*el))
}

fn next_sibling_tag<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sib| sib.value().name() == tag)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Text of the located node; `None` when the node is missing or blank.
pub fn extract_text(root: ElementRef<'_>, locator: &Locator<'_>) -> Option<String> {
    let text = element_text(locator.locate(root)?);
    if text.trim().is_empty() { None } else { Some(text) }
}

// ── Dates ─────────────────────────────────────────────────────────────────────

/// "12-11-2019" → 2019-11-12. Impossible calendar dates are rejected.
pub fn parse_date(raw: &str, field: &'static str) -> Result<NaiveDate, ScrapeError> {
    NaiveDate::parse_from_str(raw.trim(), SOURCE_DATE_FORMAT).map_err(|_| {
        ScrapeError::MalformedDate {
            field,
            value: raw.to_string(),
        }
    })
}

pub fn extract_date(
    root: ElementRef<'_>,
    locator: &Locator<'_>,
    field: &'static str,
) -> Result<Option<NaiveDate>, ScrapeError> {
    extract_text(root, locator)
        .map(|raw| parse_date(&raw, field))
        .transpose()
}

/// "04-01-1959, Krzeszowice" → (1959-01-04, "Krzeszowice"). Splits on the first comma.
pub fn split_birth(raw: &str) -> Result<(Option<NaiveDate>, Option<String>), ScrapeError> {
    let (date_part, place_part) = match raw.split_once(',') {
        Some((date, place)) => (date, Some(place)),
        None => (raw, None),
    };

    let date = if date_part.trim().is_empty() {
        None
    } else {
        Some(parse_date(date_part, "birth_date")?)
    };
    let place = place_part
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    Ok((date, place))
}

// ── Names ─────────────────────────────────────────────────────────────────────

/// Splits a heading on its last whitespace: ("Jan Maria", "Kowalski").
/// A single token is treated as the surname.
pub fn split_name(heading: &str) -> (Option<String>, Option<String>) {
    let heading = heading.trim();
    if heading.is_empty() {
        return (None, None);
    }
    match heading.rsplit_once(char::is_whitespace) {
        Some((given, surname)) => {
            let given = given.trim_end();
            (
                (!given.is_empty()).then(|| given.to_string()),
                Some(surname.to_string()),
            )
        }
        None => (None, Some(heading.to_string())),
    }
}

// ── E-mail ────────────────────────────────────────────────────────────────────

/// Undo the page's address obfuscation.
///
/// `#K r z y s z t o f   D O T   B o s a k   A T   s e j m   D O T   p l`
/// and `#Krzysztof DOT Bosak AT sejm DOT pl` both give `Krzysztof.Bosak@sejm.pl`.
/// The letter-spaced form (every token one character) separates words with
/// runs of two or more spaces; otherwise words are split on any whitespace.
pub fn decode_email(encoded: &str) -> String {
    let trimmed = encoded.trim();
    let body = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();

    let letter_spaced = body.contains("  ")
        && body.split_whitespace().all(|t| t.chars().count() == 1);

    let words: Vec<String> = if letter_spaced {
        body.split("  ")
            .map(|w| w.chars().filter(|c| !c.is_whitespace()).collect::<String>())
            .filter(|w| !w.is_empty())
            .collect()
    } else {
        body.split_whitespace().map(str::to_string).collect()
    };

    words
        .iter()
        .map(|w| match w.as_str() {
            "DOT" => ".",
            "AT" => "@",
            other => other,
        })
        .collect()
}

/// Decoded address from the `href` of `<a id=anchor_id>`; `None` if either is missing.
pub fn extract_email(root: ElementRef<'_>, anchor_id: &str) -> Option<String> {
    let anchor = find_element(root, "a", |el| el.value().id() == Some(anchor_id))?;
    let href = anchor.value().attr("href")?;
    let email = decode_email(href);
    if email.is_empty() { None } else { Some(email) }
}

// ── Club ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClubInfo {
    pub name: Option<String>,
    pub link: Option<String>,
}

/// First link inside `root`: its text is the club name, its target the club link.
pub fn extract_club(root: ElementRef<'_>) -> ClubInfo {
    match find_element(root, "a", |_| true) {
        Some(a) => ClubInfo {
            name: Some(element_text(a)).filter(|t| !t.trim().is_empty()),
            link: a.value().attr("href").map(str::to_string),
        },
        None => ClubInfo::default(),
    }
}

// ── Rules ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    PartyList,
    Constituency,
    NoOfVotes,
    ParliamentaryExperience,
    Education,
    School,
    Profession,
}

impl TextField {
    fn slot(self, p: &mut MemberProfile) -> &mut Option<String> {
        match self {
            Self::PartyList => &mut p.party_list,
            Self::Constituency => &mut p.constituency,
            Self::NoOfVotes => &mut p.no_of_votes,
            Self::ParliamentaryExperience => &mut p.parliamentary_experience,
            Self::Education => &mut p.education,
            Self::School => &mut p.school,
            Self::Profession => &mut p.profession,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    ElectedDate,
    OathDate,
}

impl DateField {
    pub fn column(self) -> &'static str {
        match self {
            Self::ElectedDate => "elected_date",
            Self::OathDate => "oath_date",
        }
    }

    fn slot(self, p: &mut MemberProfile) -> &mut Option<NaiveDate> {
        match self {
            Self::ElectedDate => &mut p.elected_date,
            Self::OathDate => &mut p.oath_date,
        }
    }
}

/// One extraction rule, applied to a scope element and written into a profile.
#[derive(Debug, Clone, Copy)]
pub enum Rule<'a> {
    Text(TextField, Locator<'a>),
    Date(DateField, Locator<'a>),
    /// First link → club name and link.
    Club,
    /// Primary heading → given name and surname.
    Heading,
    /// "date, place" text → birth date and birth place.
    Birth(Locator<'a>),
    /// Obfuscated address in the href of the anchor with this id.
    Email { anchor_id: &'a str },
}

impl Rule<'_> {
    pub fn apply(&self, scope: ElementRef<'_>, profile: &mut MemberProfile) -> Result<(), ScrapeError> {
        match *self {
            Self::Text(field, locator) => {
                *field.slot(profile) = extract_text(scope, &locator);
            }
            Self::Date(field, locator) => {
                *field.slot(profile) = extract_date(scope, &locator, field.column())?;
            }
            Self::Club => {
                let club = extract_club(scope);
                profile.club = club.name;
                profile.club_link = club.link;
            }
            Self::Heading => {
                let heading = find_element(scope, "h1", |_| true).map(element_text);
                let (name, surname) = heading.as_deref().map(split_name).unwrap_or_default();
                profile.name = name;
                profile.surname = surname;
            }
            Self::Birth(locator) => {
                if let Some(raw) = extract_text(scope, &locator) {
                    let (date, place) = split_birth(&raw)?;
                    profile.birth_date = date;
                    profile.birth_place = place;
                }
            }
            Self::Email { anchor_id } => {
                profile.email = extract_email(scope, anchor_id);
            }
        }
        Ok(())
    }
}

/// Rules scoped to the political-info list.
pub const POLITICAL_RULES: &[Rule<'static>] = &[
    Rule::Date(DateField::ElectedDate, Locator::by_class("p", "right")),
    Rule::Text(TextField::PartyList, Locator::after_label_id("p", "lblLista")),
    Rule::Text(TextField::Constituency, Locator::by_id("p", "okreg")),
    Rule::Text(TextField::NoOfVotes, Locator::after_label_id("p", "lblGlosy")),
    Rule::Date(DateField::OathDate, Locator::after_label_text("p", "Ślubowanie:")),
    Rule::Text(TextField::ParliamentaryExperience, Locator::after_label_id("p", "lblStaz")),
    Rule::Club,
];

/// Rules scoped to the `div.cv` personal-info block.
pub const PERSONAL_RULES: &[Rule<'static>] = &[
    Rule::Birth(Locator::by_id("p", "urodzony")),
    Rule::Text(TextField::Education, Locator::after_label_id("p", "lblWyksztalcenie")),
    Rule::Text(TextField::School, Locator::after_label_id("p", "lblSzkola")),
    Rule::Text(TextField::Profession, Locator::after_label_id("p", "lblZawod")),
];

// ── Tests ─────────────────────────────────────────────────────────────────────
