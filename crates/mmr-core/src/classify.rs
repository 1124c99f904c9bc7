//! Ordered chain of file name matchers.
//!
//! Each [`Matcher`] pairs a predicate (does the name follow this convention?)
//! with a builder (what should it be called?). The chain is evaluated top to
//! bottom and the first builder that returns an outcome wins. Conventions
//! overlap, so the order in [`CHAIN`] is part of the behaviour: an already
//! renamed file must never be treated as a fresh camera file.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::{Captures, Regex};

use crate::bucket::Category;
use crate::date::{CanonicalTimestamp, TimestampResolver};
use crate::media::{MediaItem, MediaKind};
use crate::naming::NameDescriptor;

static CANONICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<date>\d{4}_\d{4}_\d{6})(?:_(?P<seq>\d{4}|G\d{7}))?(?:_(?P<tail>.+))?$").unwrap()
});
static CANONICAL_VARIANT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?P<date>\d{4}_\d{4}_\d{6})[ _-]+(?P<tail>[a-z].*)$").unwrap());
static GOPRO_SEQUENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^(?P<seq>G\d{7})$").unwrap());
static VENDOR_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?P<prefix>[a-z]+)_?)?(?P<ymd>\d{8})_(?P<hms>\d{6})(?P<rest>.*)$").unwrap()
});
static VENDOR_DASHED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<y>\d{4})-(?P<mo>\d{2})-(?P<d>\d{2}) (?P<h>\d{1,2})\.(?P<mi>\d{1,2})\.(?P<s>\d{1,2})").unwrap()
});
static STANDARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<prefix>[A-Za-z_]{4})(?P<seq>\d{4})(?:[_-]?(?P<suffix>[A-Za-z]))?$").unwrap()
});
static DEVICE_THUMBNAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+-[0-9a-f]+-\d+$").unwrap());
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[_\-( ])(?P<marker>HDR|PANO)(?:$|[_\-) ])").unwrap());
static COLLISION_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_\d+$").unwrap());

/// Naming conventions, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    ThumbsDb,
    NonMedia,
    Canonical,
    CanonicalVariant,
    GoProSequence,
    VendorUnderscore,
    VendorDashed,
    StandardCamera,
    DeviceThumbnail,
}

/// Where a file ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not part of the plan at all.
    Skip,
    /// Reported only.
    Diagnostic(Category),
    /// Sidecar to be removed after its own confirmation.
    Delete,
    /// Proposed new name, still subject to collision resolution.
    Rename(Category, NameDescriptor),
}

/// Outcome plus the rule that produced it (`None` for the fallback).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub rule: Option<Rule>,
    pub outcome: Outcome,
}

/// Captured groups of a successful predicate.
pub struct Hit<'a> {
    caps: Option<Captures<'a>>,
}

impl<'a> Hit<'a> {
    fn bare() -> Self {
        Self { caps: None }
    }

    fn get(&self, name: &str) -> Option<&'a str> {
        self.caps.as_ref()?.name(name).map(|m| m.as_str())
    }
}

impl<'a> From<Captures<'a>> for Hit<'a> {
    fn from(caps: Captures<'a>) -> Self {
        Self { caps: Some(caps) }
    }
}

type Predicate = fn(&MediaItem) -> Option<Hit<'_>>;
type Builder = fn(&MediaItem, &Hit<'_>, &TimestampResolver<'_>) -> Option<Outcome>;

pub struct Matcher {
    pub rule: Rule,
    predicate: Predicate,
    build: Builder,
}

pub static CHAIN: [Matcher; 9] = [
    Matcher { rule: Rule::ThumbsDb, predicate: is_thumbs_db, build: skip },
    Matcher { rule: Rule::NonMedia, predicate: is_non_media, build: unknown },
    Matcher { rule: Rule::Canonical, predicate: match_canonical, build: build_previous_rename },
    Matcher { rule: Rule::CanonicalVariant, predicate: match_canonical_variant, build: build_previous_rename },
    Matcher { rule: Rule::GoProSequence, predicate: match_gopro_sequence, build: build_gopro_sequence },
    Matcher { rule: Rule::VendorUnderscore, predicate: match_vendor_underscore, build: build_vendor_underscore },
    Matcher { rule: Rule::VendorDashed, predicate: match_vendor_dashed, build: build_vendor_dashed },
    Matcher { rule: Rule::StandardCamera, predicate: match_standard, build: build_standard },
    Matcher { rule: Rule::DeviceThumbnail, predicate: match_device_thumbnail, build: build_device_thumbnail },
];

pub struct Classifier<'a> {
    resolver: TimestampResolver<'a>,
}

impl<'a> Classifier<'a> {
    pub fn new(resolver: TimestampResolver<'a>) -> Self {
        Self { resolver }
    }

    pub fn classify(&self, item: &MediaItem) -> Classification {
        for matcher in &CHAIN {
            let Some(hit) = (matcher.predicate)(item) else {
                continue;
            };
            if let Some(outcome) = (matcher.build)(item, &hit, &self.resolver) {
                tracing::debug!("{}: {:?} -> {:?}", item.file_name, matcher.rule, outcome);
                return Classification {
                    rule: Some(matcher.rule),
                    outcome,
                };
            }
            tracing::debug!("{}: {:?} matched but produced no name", item.file_name, matcher.rule);
        }
        Classification {
            rule: None,
            outcome: Outcome::Diagnostic(Category::Unknown),
        }
    }
}

// ---- predicates ----

fn is_thumbs_db(item: &MediaItem) -> Option<Hit<'_>> {
    item.file_name.eq_ignore_ascii_case("thumbs.db").then(Hit::bare)
}

fn is_non_media(item: &MediaItem) -> Option<Hit<'_>> {
    (!item.kind().is_media()).then(Hit::bare)
}

fn match_canonical(item: &MediaItem) -> Option<Hit<'_>> {
    CANONICAL_RE.captures(&item.base_name).map(Hit::from)
}

fn match_canonical_variant(item: &MediaItem) -> Option<Hit<'_>> {
    CANONICAL_VARIANT_RE.captures(&item.base_name).map(Hit::from)
}

fn match_gopro_sequence(item: &MediaItem) -> Option<Hit<'_>> {
    if !matches!(item.ext_lower.as_str(), "jpg" | "jpeg") {
        return None;
    }
    GOPRO_SEQUENCE_RE.captures(&item.base_name).map(Hit::from)
}

fn match_vendor_underscore(item: &MediaItem) -> Option<Hit<'_>> {
    VENDOR_UNDERSCORE_RE.captures(&item.base_name).map(Hit::from)
}

fn match_vendor_dashed(item: &MediaItem) -> Option<Hit<'_>> {
    VENDOR_DASHED_RE.captures(&item.base_name).map(Hit::from)
}

fn match_standard(item: &MediaItem) -> Option<Hit<'_>> {
    STANDARD_RE.captures(&item.base_name).map(Hit::from)
}

fn match_device_thumbnail(item: &MediaItem) -> Option<Hit<'_>> {
    DEVICE_THUMBNAIL_RE.captures(&item.base_name).map(Hit::from)
}

// ---- builders ----

fn skip(_: &MediaItem, _: &Hit<'_>, _: &TimestampResolver<'_>) -> Option<Outcome> {
    Some(Outcome::Skip)
}

fn unknown(_: &MediaItem, _: &Hit<'_>, _: &TimestampResolver<'_>) -> Option<Outcome> {
    Some(Outcome::Diagnostic(Category::Unknown))
}

/// Shared by both canonical rules. With an image number the date is read
/// again from metadata only; without one the embedded date is trusted.
fn build_previous_rename(item: &MediaItem, hit: &Hit<'_>, resolver: &TimestampResolver<'_>) -> Option<Outcome> {
    let old_token = hit.get("date")?;
    let old_ts = CanonicalTimestamp::parse_token(old_token)?;
    let sequence = hit.get("seq");

    let new_ts = match sequence {
        Some(_) => match resolver.metadata_only(item) {
            Some(ts) => ts,
            None => return Some(Outcome::Diagnostic(Category::PreviousRenameNewDateNotFound)),
        },
        None => old_ts,
    };

    let mut descriptor = NameDescriptor::new(new_ts, retag_tail(hit.get("tail"), &item.camera_tag), &item.ext);
    if let Some(seq) = sequence {
        descriptor = descriptor.with_sequence(seq);
    }

    if descriptor.render() == item.file_name {
        return Some(Outcome::Diagnostic(Category::PreviousRenameMatch));
    }
    let category = if new_ts != old_ts {
        Category::PreviousRenameNewDate
    } else {
        Category::PreviousRenameNewName
    };
    Some(Outcome::Rename(category, descriptor))
}

/// Replace the leading tag segment of an existing tail with `tag`, keeping
/// auxiliary markers and dropping a collision suffix.
fn retag_tail(tail: Option<&str>, tag: &str) -> String {
    let extras = match tail {
        None => "",
        Some(t) if t == tag => "",
        Some(t) if t.starts_with(tag) && t[tag.len()..].starts_with('_') => &t[tag.len()..],
        Some(t) => t.find('_').map_or("", |i| &t[i..]),
    };
    let extras = COLLISION_SUFFIX_RE.replace(extras, "");
    format!("{}{}", tag, extras)
}

fn build_gopro_sequence(item: &MediaItem, hit: &Hit<'_>, resolver: &TimestampResolver<'_>) -> Option<Outcome> {
    let ts = resolver.resolve(item)?;
    let descriptor = NameDescriptor::new(ts, &item.camera_tag, &item.ext).with_sequence(hit.get("seq")?);
    Some(Outcome::Rename(Category::GoProSequence, descriptor))
}

fn build_vendor_underscore(item: &MediaItem, hit: &Hit<'_>, _: &TimestampResolver<'_>) -> Option<Outcome> {
    let raw = format!("{}{}", hit.get("ymd")?, hit.get("hms")?);
    let ts = NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S").ok()?;

    let marker = match hit.get("prefix") {
        Some(prefix) if prefix.eq_ignore_ascii_case("PANO") => Some("PANO".to_string()),
        _ => hit
            .get("rest")
            .and_then(|rest| MARKER_RE.captures(rest))
            .map(|caps| caps["marker"].to_uppercase()),
    };

    let mut descriptor = NameDescriptor::new(CanonicalTimestamp::new(ts), &item.camera_tag, &item.ext);
    if let Some(marker) = marker {
        descriptor = descriptor.with_marker(&marker);
    }
    Some(Outcome::Rename(Category::Samsung, descriptor))
}

fn build_vendor_dashed(item: &MediaItem, hit: &Hit<'_>, _: &TimestampResolver<'_>) -> Option<Outcome> {
    let raw = format!(
        "{}{}{}{:0>2}{:0>2}{:0>2}",
        hit.get("y")?,
        hit.get("mo")?,
        hit.get("d")?,
        hit.get("h")?,
        hit.get("mi")?,
        hit.get("s")?
    );
    let ts = NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S").ok()?;
    let descriptor = NameDescriptor::new(CanonicalTimestamp::new(ts), &item.camera_tag, &item.ext);
    Some(Outcome::Rename(Category::Samsung, descriptor))
}

fn build_standard(item: &MediaItem, hit: &Hit<'_>, resolver: &TimestampResolver<'_>) -> Option<Outcome> {
    if item.kind() == MediaKind::SidecarForDeletion {
        return Some(Outcome::Delete);
    }
    let ts = resolver.resolve(item)?;
    let mut descriptor = NameDescriptor::new(ts, &item.camera_tag, &item.ext).with_sequence(hit.get("seq")?);
    if let Some(suffix) = hit.get("suffix") {
        descriptor = descriptor.with_marker(&suffix.to_uppercase());
    }
    Some(Outcome::Rename(Category::Standard, descriptor))
}

fn build_device_thumbnail(item: &MediaItem, _: &Hit<'_>, resolver: &TimestampResolver<'_>) -> Option<Outcome> {
    let ts = resolver.resolve(item)?;
    let descriptor = NameDescriptor::new(ts, &item.camera_tag, &item.ext);
    Some(Outcome::Rename(Category::HtcThumbnail, descriptor))
}
