//! Document profiles: per-document-type correction tables and lexicons.
//!
//! Every profile shares the base lexicon and adds its own vocabulary and
//! misread table. Entries are normalized the same way document text is, so
//! they may be written in any Unicode form.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use super::normalize::normalize_word;

/// Kind of document being corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentProfile {
    #[default]
    General,
    /// Government notices, memos and orders
    Official,
    /// Papers, theses and textbooks
    Academic,
    /// Newspaper and wire copy
    News,
}

impl DocumentProfile {
    pub const ALL: [DocumentProfile; 4] = [
        DocumentProfile::General,
        DocumentProfile::Official,
        DocumentProfile::Academic,
        DocumentProfile::News,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentProfile::General => "general",
            DocumentProfile::Official => "official",
            DocumentProfile::Academic => "academic",
            DocumentProfile::News => "news",
        }
    }

    /// The profile's normalized lexicon and correction table.
    pub fn tables(self) -> &'static ProfileTables {
        // Every variant is inserted when the map is built.
        &PROFILE_TABLES[&self]
    }

    fn raw_tables(self) -> (&'static [&'static str], &'static [(&'static str, &'static str)]) {
        match self {
            DocumentProfile::General => (GENERAL_WORDS, GENERAL_CORRECTIONS),
            DocumentProfile::Official => (OFFICIAL_WORDS, OFFICIAL_CORRECTIONS),
            DocumentProfile::Academic => (ACADEMIC_WORDS, ACADEMIC_CORRECTIONS),
            DocumentProfile::News => (NEWS_WORDS, NEWS_CORRECTIONS),
        }
    }
}

impl fmt::Display for DocumentProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a profile name is not recognized.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownProfileError {
    pub name: String,
}

impl fmt::Display for UnknownProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown document profile '{}'. Expected one of: general, official, academic, news",
            self.name
        )
    }
}

impl std::error::Error for UnknownProfileError {}

impl FromStr for DocumentProfile {
    type Err = UnknownProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        DocumentProfile::ALL
            .into_iter()
            .find(|profile| profile.as_str() == wanted)
            .ok_or_else(|| UnknownProfileError {
                name: s.to_string(),
            })
    }
}

/// Normalized dictionary data for one profile.
#[derive(Debug)]
pub struct ProfileTables {
    /// Known-good words (base + profile + correction targets), lowercased
    pub lexicon: BTreeSet<String>,
    /// Misread → correct, both lowercased
    pub corrections: HashMap<String, String>,
}

impl ProfileTables {
    pub fn is_known(&self, word: &str) -> bool {
        self.lexicon.contains(word)
    }
}

lazy_static! {
    static ref PROFILE_TABLES: HashMap<DocumentProfile, ProfileTables> = DocumentProfile::ALL
        .into_iter()
        .map(|profile| (profile, build_tables(profile)))
        .collect();
}

fn build_tables(profile: DocumentProfile) -> ProfileTables {
    let (words, corrections) = profile.raw_tables();
    let normalize = |word: &str| normalize_word(word).to_lowercase();

    let corrections: HashMap<String, String> = GENERAL_CORRECTIONS
        .iter()
        .chain(corrections.iter())
        .map(|&(from, to)| (normalize(from), normalize(to)))
        .collect();

    let mut lexicon: BTreeSet<String> = BASE_WORDS
        .iter()
        .chain(words.iter())
        .map(|&word| normalize(word))
        .collect();
    lexicon.extend(corrections.values().cloned());

    ProfileTables {
        lexicon,
        corrections,
    }
}

const BASE_WORDS: &[&str] = &[
    // Bengali function words and common vocabulary
    "আমি", "আমরা", "আমার", "আমাদের", "তুমি", "তোমার", "আপনি", "আপনার", "সে", "তার",
    "তারা", "তাদের", "এবং", "ও", "কিন্তু", "অথবা", "বা", "যদি", "তবে", "কারণ", "এই",
    "সেই", "ওই", "যে", "যা", "কি", "কী", "কেন", "কোন", "কখনো", "না", "নয়", "নেই",
    "আছে", "ছিল", "হবে", "হয়", "হয়েছে", "হয়েছিল", "করা", "করে", "করেন", "করেছে",
    "করবে", "বলা", "বলে", "বলেন", "দেওয়া", "দিয়ে", "নিয়ে", "থেকে", "জন্য", "সাথে",
    "সঙ্গে", "মধ্যে", "উপর", "নিচে", "পরে", "আগে", "এখন", "তখন", "সব", "সকল",
    "অনেক", "কিছু", "প্রতি", "মাধ্যমে", "দেশ", "বাংলা", "বাংলাদেশ", "ভাষা", "মানুষ",
    "সময়", "দিন", "রাত", "বছর", "মাস", "কাজ", "কথা", "বই", "লেখা", "পড়া", "ভাত",
    "খাই", "খাও", "ভাল", "ভালো", "বড়", "ছোট", "নতুন", "পুরাতন", "প্রথম", "শেষ",
    "একটি", "দুটি", "এক", "দুই", "তিন", "চার", "পাঁচ", "জেলা", "শহর", "গ্রাম",
    "পরিবার", "শিক্ষা", "স্বাস্থ্য", "উন্নয়ন", "অনুযায়ী", "বিষয়", "তথ্য", "সম্পর্কে",
    // English function words and common vocabulary
    "the", "a", "an", "and", "or", "but", "of", "to", "in", "on", "at", "for", "with",
    "by", "from", "as", "is", "are", "was", "were", "be", "been", "has", "have", "had",
    "it", "its", "this", "that", "these", "those", "which", "who", "not", "no", "yes",
    "all", "any", "more", "most", "other", "some", "such", "than", "then", "there",
    "their", "they", "we", "our", "you", "your", "he", "she", "his", "her", "will",
    "would", "can", "could", "should", "may", "must", "page", "document", "date", "name",
    "number", "time", "year", "day", "people", "country", "language", "text", "file",
    "office", "report",
];

const GENERAL_WORDS: &[&str] = &["চিঠি", "ঠিকানা", "ফোন", "letter", "address", "phone"];

/// Misreads common to every document type.
const GENERAL_CORRECTIONS: &[(&str, &str)] = &[
    ("tbe", "the"),
    ("tlie", "the"),
    ("arid", "and"),
    ("wliich", "which"),
    ("bave", "have"),
    ("tbat", "that"),
    ("witb", "with"),
    ("aud", "and"),
    ("আমর", "আমরা"),
    ("বাংল", "বাংলা"),
    ("বাংলাদেষ", "বাংলাদেশ"),
    ("মানুস", "মানুষ"),
];

const OFFICIAL_WORDS: &[&str] = &[
    "সরকার", "সরকারি", "মন্ত্রণালয়", "দপ্তর", "অধিদপ্তর", "আদেশ", "প্রজ্ঞাপন", "কর্মকর্তা",
    "কর্মচারী", "সচিব", "তারিখ", "স্মারক", "নম্বর", "অনুমোদন", "আবেদন", "নির্দেশ",
    "ministry", "memo", "notice", "order", "secretary", "department", "approval",
    "application", "circular",
];

const OFFICIAL_CORRECTIONS: &[(&str, &str)] = &[
    ("সরকর", "সরকার"),
    ("মন্ত্রনালয়", "মন্ত্রণালয়"),
    ("প্রজ্ঞাপণ", "প্রজ্ঞাপন"),
    ("কর্মকতা", "কর্মকর্তা"),
    ("ministiy", "ministry"),
    ("circu1ar", "circular"),
];

const ACADEMIC_WORDS: &[&str] = &[
    "গবেষণা", "বিশ্ববিদ্যালয়", "অধ্যায়", "পরীক্ষা", "ফলাফল", "বিশ্লেষণ", "তত্ত্ব",
    "পদ্ধতি", "উপসংহার", "সারসংক্ষেপ", "research", "university", "chapter", "analysis",
    "abstract", "theory", "method", "results", "conclusion", "references",
];

const ACADEMIC_CORRECTIONS: &[(&str, &str)] = &[
    ("গবেষনা", "গবেষণা"),
    ("বিশ্লেষন", "বিশ্লেষণ"),
    ("পদ্বতি", "পদ্ধতি"),
    ("univcrsity", "university"),
    ("anaiysis", "analysis"),
    ("tbeory", "theory"),
];

const NEWS_WORDS: &[&str] = &[
    "সংবাদ", "প্রতিবেদন", "প্রতিবেদক", "খবর", "নির্বাচন", "প্রধানমন্ত্রী", "রাষ্ট্রপতি",
    "সংসদ", "পুলিশ", "ঘটনা", "news", "election", "minister", "parliament", "police",
    "reporter", "according", "said",
];

const NEWS_CORRECTIONS: &[(&str, &str)] = &[
    ("নিবাচন", "নির্বাচন"),
    ("সংবাধ", "সংবাদ"),
    ("প্রতিবেদণ", "প্রতিবেদন"),
    ("e1ection", "election"),
    ("poiice", "police"),
];
