//! Static configuration with zero-allocation design.
//! All strings are &'static str to avoid lifetime complexity.

use chrono::Weekday;

/// News feed definition with static lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSource {
    pub name: &'static str,
    pub url: &'static str,
    pub icon: &'static str,
}

impl FeedSource {
    const fn new(name: &'static str, url: &'static str, icon: &'static str) -> Self {
        Self { name, url, icon }
    }
}

/// Name of the source that already publishes in Arabic.
pub const ARABIC_SOURCE: &str = "البوابة العربية";

/// Links containing this fragment point at Arabic content.
pub const ARABIC_DOMAIN: &str = "aitnews";

/// Static feed registry - compile-time constant, zero heap allocation
pub static SOURCES: &[FeedSource] = &[
    FeedSource::new(
        "Hacker News",
        "https://feeds.feedburner.com/TheHackersNews",
        "🛡️",
    ),
    FeedSource::new("Dev.to", "https://dev.to/feed", "💻"),
    FeedSource::new(
        ARABIC_SOURCE,
        "https://aitnews.com/category/security-news/feed/",
        "🌐",
    ),
];

/// A slot in the weekly timetable
#[derive(Debug, Clone, Copy)]
pub struct Lecture {
    pub day: &'static str,
    pub weekday: Weekday,
    pub subject: &'static str,
    pub time: &'static str,
}

impl Lecture {
    const fn new(
        day: &'static str,
        weekday: Weekday,
        subject: &'static str,
        time: &'static str,
    ) -> Self {
        Self { day, weekday, subject, time }
    }
}

pub static LECTURES: &[Lecture] = &[
    Lecture::new("الاثنين", Weekday::Mon, "الدفاع عن الشبكات", "3:50م"),
    Lecture::new("الثلاثاء", Weekday::Tue, "اساسيات التشفير", "3:50م"),
    Lecture::new("الثلاثاء", Weekday::Tue, "التشريعات الاخلاقية", "6:50م"),
    Lecture::new("الاربعاء", Weekday::Wed, "تصميم الامن السيبراني", "3:50م"),
    Lecture::new("الاربعاء", Weekday::Wed, "انظمة تقنية المعلومات", "6:50م"),
];

/// Storage keys, kept identical to the mobile app's so exported data loads as-is
pub mod keys {
    pub const PLANNER: &str = "@personal_assistant_vfinal";
    pub const IDEAS: &str = "@my_ideas";
}

/// Notification texts
pub mod messages {
    pub const SMOKE_TITLE: &str = "تذكير التدخين 🚭";
    pub const SMOKE_BODY: &str = "مرت ساعة كاملة.. هل يمكنك الصمود ساعة أخرى؟ 💪";
    pub const LECTURE_TITLE: &str = "موعد المحاضرة القادم 🎓";
}

/// HTTP headers
pub mod headers {
    pub const USER_AGENT: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const ACCEPT_RSS: &str =
        "application/rss+xml,application/xml,text/xml;q=0.9,*/*;q=0.8";
}

/// Limits and thresholds
pub mod limits {
    /// Only the freshest headlines are sent to the translator.
    pub const TRANSLATE_PREFIX: usize = 15;
    pub const REQUEST_TIMEOUT_SECS: u64 = 15;
    pub const SMOKE_DELAY_SECS: u64 = 3600;
    pub const MAX_MESSAGE_LEN: usize = 4000;
    pub const MAX_TITLE_CHARS: usize = 200;
}

/// Language pair used for headline translation
pub mod lang {
    pub const SOURCE: &str = "en";
    pub const TARGET: &str = "ar";
}
