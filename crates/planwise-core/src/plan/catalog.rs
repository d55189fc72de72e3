//! Static reference tables the generator draws from.

use planwise_db::models::ResourceKind;

/// An entry in a subject's resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogResource {
    pub title: &'static str,
    pub url: &'static str,
    pub kind: &'static str,
}

impl CatalogResource {
    pub fn kind(&self) -> ResourceKind {
        ResourceKind::from(self.kind)
    }
}

const fn resource(title: &'static str, url: &'static str, kind: &'static str) -> CatalogResource {
    CatalogResource { title, url, kind }
}

pub const MATHS_TOPICS: [&str; 9] = [
    "Introduction to Algebra",
    "Linear Equations",
    "Quadratic Equations",
    "Geometry Basics",
    "Trigonometry",
    "Calculus Fundamentals",
    "Statistics and Probability",
    "Number Theory",
    "Matrices",
];

pub const ENGLISH_TOPICS: [&str; 9] = [
    "Grammar Essentials",
    "Essay Writing",
    "Critical Reading",
    "Literature Analysis",
    "Creative Writing",
    "Research Paper Writing",
    "Public Speaking",
    "Vocabulary Building",
    "Rhetoric and Persuasion",
];

pub const SCIENCE_TOPICS: [&str; 9] = [
    "Scientific Method",
    "Physics Fundamentals",
    "Chemistry Basics",
    "Biology Essentials",
    "Earth Science",
    "Astronomy",
    "Environmental Science",
    "Genetics",
    "Energy and Matter",
];

pub const MATHS_RESOURCES: [CatalogResource; 3] = [
    resource("Khan Academy Math", "https://www.khanacademy.org/math", "video"),
    resource("MIT OpenCourseWare", "https://ocw.mit.edu/courses/mathematics/", "video"),
    resource("Brilliant - Mathematics", "https://brilliant.org/math/", "link"),
];

pub const ENGLISH_RESOURCES: [CatalogResource; 3] = [
    resource("Purdue Online Writing Lab", "https://owl.purdue.edu/", "document"),
    resource("Grammarly Blog", "https://www.grammarly.com/blog/", "link"),
    resource("TED Talks for English Learners", "https://www.ted.com/", "video"),
];

pub const SCIENCE_RESOURCES: [CatalogResource; 3] = [
    resource("National Geographic", "https://www.nationalgeographic.com/science/", "link"),
    resource("NASA Science", "https://science.nasa.gov/", "link"),
    resource("SciShow YouTube Channel", "https://www.youtube.com/user/scishow", "video"),
];

/// Subject of a generation request. Anything unrecognised is `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Maths,
    English,
    Science,
    General,
}

impl Subject {
    /// Case-insensitive match; blank or unknown input is `General`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "maths" => Self::Maths,
            "english" => Self::English,
            "science" => Self::Science,
            _ => Self::General,
        }
    }

    /// Topic titles eligible for a plan on this subject.
    ///
    /// `General` mixes the first three entries of each known subject.
    pub fn topic_pool(self) -> Vec<&'static str> {
        match self {
            Self::Maths => MATHS_TOPICS.to_vec(),
            Self::English => ENGLISH_TOPICS.to_vec(),
            Self::Science => SCIENCE_TOPICS.to_vec(),
            Self::General => MATHS_TOPICS[..3]
                .iter()
                .chain(&ENGLISH_TOPICS[..3])
                .chain(&SCIENCE_TOPICS[..3])
                .copied()
                .collect(),
        }
    }

    /// Resources attached, in order, to a plan on this subject.
    ///
    /// `General` takes the whole maths pool plus the first english and
    /// first science entry.
    pub fn resource_pool(self) -> Vec<CatalogResource> {
        match self {
            Self::Maths => MATHS_RESOURCES.to_vec(),
            Self::English => ENGLISH_RESOURCES.to_vec(),
            Self::Science => SCIENCE_RESOURCES.to_vec(),
            Self::General => MATHS_RESOURCES
                .iter()
                .chain(&ENGLISH_RESOURCES[..1])
                .chain(&SCIENCE_RESOURCES[..1])
                .copied()
                .collect(),
        }
    }
}

/// Difficulty of a generation request. Anything unrecognised is `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    General,
}

impl Difficulty {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "beginner" => Self::Beginner,
            "intermediate" => Self::Intermediate,
            "advanced" => Self::Advanced,
            _ => Self::General,
        }
    }

    pub fn title_prefix(self) -> &'static str {
        match self {
            Self::Beginner => "Introduction to ",
            Self::Intermediate => "Mastering ",
            Self::Advanced => "Advanced ",
            Self::General => "Complete Guide to ",
        }
    }

    /// Number of topics to draw, before clamping to the pool size.
    pub fn topic_count(self) -> usize {
        match self {
            Self::Beginner => 5,
            Self::Intermediate => 7,
            Self::Advanced => 9,
            Self::General => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn subject_parse_ignores_case() {
        assert_eq!(Subject::parse("Maths"), Subject::Maths);
        assert_eq!(Subject::parse("ENGLISH"), Subject::English);
        assert_eq!(Subject::parse(" science "), Subject::Science);
        assert_eq!(Subject::parse("history"), Subject::General);
        assert_eq!(Subject::parse(""), Subject::General);
    }

    #[test]
    fn difficulty_parse_ignores_case() {
        assert_eq!(Difficulty::parse("Beginner"), Difficulty::Beginner);
        assert_eq!(Difficulty::parse("intermediate"), Difficulty::Intermediate);
        assert_eq!(Difficulty::parse("ADVANCED"), Difficulty::Advanced);
        assert_eq!(Difficulty::parse("expert"), Difficulty::General);
        assert_eq!(Difficulty::parse("   "), Difficulty::General);
    }

    #[test]
    fn general_topic_pool_mixes_first_three_of_each() {
        let pool = Subject::General.topic_pool();
        assert_eq!(pool.len(), 9);
        assert_eq!(&pool[..3], &MATHS_TOPICS[..3]);
        assert_eq!(&pool[3..6], &ENGLISH_TOPICS[..3]);
        assert_eq!(&pool[6..], &SCIENCE_TOPICS[..3]);
    }

    #[test]
    fn general_resource_pool_has_five_entries() {
        let pool = Subject::General.resource_pool();
        let titles: Vec<&str> = pool.iter().map(|r| r.title).collect();
        assert_eq!(
            titles,
            [
                "Khan Academy Math",
                "MIT OpenCourseWare",
                "Brilliant - Mathematics",
                "Purdue Online Writing Lab",
                "National Geographic",
            ]
        );
    }

    #[test]
    fn pools_have_no_duplicate_titles() {
        for subject in [Subject::Maths, Subject::English, Subject::Science, Subject::General] {
            let pool = subject.topic_pool();
            let unique: HashSet<_> = pool.iter().collect();
            assert_eq!(unique.len(), pool.len(), "{subject:?}");
        }
    }

    #[test]
    fn catalog_resource_kinds_are_known() {
        for entry in MATHS_RESOURCES
            .iter()
            .chain(&ENGLISH_RESOURCES)
            .chain(&SCIENCE_RESOURCES)
        {
            assert!(
                !matches!(entry.kind(), ResourceKind::Other(_)),
                "{} has kind {}",
                entry.title,
                entry.kind
            );
        }
    }
}
