//! Parameter extractors
//!
//! Each extractor is a pure function over the utterance that returns `None`
//! when nothing matches. None of them panic or return errors. When a
//! sentence holds two candidates (two weekday names, say) the first match
//! in the text wins.

use crate::command::intent::Intent;
use crate::command::params::{Timeframe, Utterance};
use crate::core::calendar::{next_weekday, TimePeriod};
use crate::core::types::{Difficulty, FocusLevel, Priority, Task};
use chrono::{Duration, NaiveDate, NaiveTime, Weekday};
use regex::Regex;
use std::sync::LazyLock;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static extractor pattern")
}

/// Words that end a free-text segment ("finish the essay| due friday")
const TAIL: &str = r"(?:\s+(?:due|by|on|at|before|for|today|tonight|tomorrow|next|this|in|(?:mon|tues|wednes|thurs|fri|satur|sun)day)\b.*)?[.!?]?$";

// === DATE ===

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(\d{4})-(\d{2})-(\d{2})\b"));
static IN_DAYS: LazyLock<Regex> = LazyLock::new(|| compile(r"\bin\s+(\d{1,3})\s+days?\b"));
static WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(?:(next|this)\s+)?(mon|tues|wednes|thurs|fri|satur|sun)day\b")
});
static NEXT_WEEK: LazyLock<Regex> = LazyLock::new(|| compile(r"\bnext\s+week\b"));

/// Resolve a date mentioned in `text` relative to `today`
///
/// Checked in order: "today", "day after tomorrow", "tomorrow", ISO dates,
/// "in N days", weekday names, "next week". A weekday resolves to its next
/// occurrence on or after today; when it is today, "next" (either "next
/// friday" or "next week") pushes it a full week out.
pub fn extract_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if text.contains("today") || text.contains("tonight") {
        return Some(today);
    }
    if text.contains("day after tomorrow") {
        return Some(today + Duration::days(2));
    }
    if text.contains("tomorrow") {
        return Some(today + Duration::days(1));
    }
    if let Some(caps) = ISO_DATE.captures(text) {
        let y = caps[1].parse().ok()?;
        let m = caps[2].parse().ok()?;
        let d = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            return Some(date);
        }
    }
    if let Some(caps) = IN_DAYS.captures(text) {
        let days: i64 = caps[1].parse().ok()?;
        return Some(today + Duration::days(days));
    }
    if let Some(caps) = WEEKDAY.captures(text) {
        let weekday = match &caps[2] {
            "mon" => Weekday::Mon,
            "tues" => Weekday::Tue,
            "wednes" => Weekday::Wed,
            "thurs" => Weekday::Thu,
            "fri" => Weekday::Fri,
            "satur" => Weekday::Sat,
            _ => Weekday::Sun,
        };
        let force = caps.get(1).is_some_and(|q| q.as_str() == "next") || NEXT_WEEK.is_match(text);
        return Some(next_weekday(today, weekday, force));
    }
    if NEXT_WEEK.is_match(text) {
        return Some(today + Duration::days(7));
    }
    None
}

// === TIME ===

static TIME_12H: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(\d{1,2})(?::(\d{2}))?\s*(am\b|pm\b|a\.m\.|p\.m\.)"));
static TIME_24H: LazyLock<Regex> = LazyLock::new(|| compile(r"\b([01]?\d|2[0-3]):([0-5]\d)\b"));
static NOON: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(noon|midday|midnight)\b"));

/// Clock time, normalized to 24-hour
///
/// `12am` is 00:xx and `12pm` stays 12:xx.
pub fn extract_time(text: &str) -> Option<NaiveTime> {
    if let Some(caps) = TIME_12H.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        if (1..=12).contains(&hour) {
            let pm = caps[3].starts_with('p');
            let hour = match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            };
            return NaiveTime::from_hms_opt(hour, minute, 0);
        }
    }
    if let Some(caps) = TIME_24H.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }
    if let Some(caps) = NOON.captures(text) {
        let hour = if &caps[1] == "midnight" { 0 } else { 12 };
        return NaiveTime::from_hms_opt(hour, 0, 0);
    }
    None
}

// === DURATION ===

static HOURS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(\d+(?:\.\d+)?)\s*-?\s*(?:hours?|hrs?)\b"));
static MINUTES: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(\d+)\s*-?\s*(?:minutes?|mins?)\b"));

/// Longest length accepted for a single session or task
const MAX_HOURS: f64 = 24.0;

/// Duration in hours; minutes are converted by dividing by 60
///
/// Lengths over a day are rejected.
pub fn extract_duration(text: &str) -> Option<f64> {
    let hours = if let Some(caps) = HOURS.captures(text) {
        caps[1].parse::<f64>().ok()
    } else if let Some(caps) = MINUTES.captures(text) {
        caps[1].parse::<f64>().ok().map(|m| m / 60.0)
    } else {
        None
    };
    hours.filter(|h| *h > 0.0 && *h <= MAX_HOURS)
}

// === PRIORITY ===

// The optional negation group keeps "not urgent" out of the high bucket.
static PRIORITY_HIGH: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(\bnot\s+|\bnon-?)?\b(urgent|urgently|critical|important|asap|high(?:\s+priority)?)\b")
});
static PRIORITY_MEDIUM: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b(medium|moderate|normal)(?:\s+priority)?\b"));
static PRIORITY_LOW: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(low(?:\s+priority)?|later|whenever|not\s+urgent|non-?urgent|no\s+rush)\b")
});

/// Priority bucket; buckets are checked high, medium, low and the first hit wins
pub fn extract_priority(text: &str) -> Option<Priority> {
    let high = PRIORITY_HIGH
        .captures_iter(text)
        .any(|caps| caps.get(1).is_none());
    if high {
        return Some(Priority::High);
    }
    if PRIORITY_MEDIUM.is_match(text) {
        return Some(Priority::Medium);
    }
    if PRIORITY_LOW.is_match(text) {
        return Some(Priority::Low);
    }
    None
}

// === COURSE ===

static COURSE_CODE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b([A-Z]{2,5})\s?(\d{2,3}[A-Z]?)\b"));
static COURSE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(cs|cse|ece|math|bio|biol|chem|phys|econ|engl|hist|psyc|psych|stat|phil)\s?(\d{2,3}[a-z]?)\b")
});
static DEPARTMENT: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(computer science|mathematics|calculus|biology|chemistry|physics|economics|history|psychology|statistics|philosophy|english)\b")
});

/// Short words that look like a department prefix when shouted ("AT 10:30")
const NOT_DEPARTMENTS: &[&str] = &[
    "AT", "ON", "BY", "IN", "TO", "FOR", "DUE", "AM", "PM", "AND", "THE", "OR", "OF", "IS", "IT",
];

/// Course code or department name, upper-cased
pub fn extract_course(utterance: &Utterance) -> Option<String> {
    let raw = &utterance.raw;
    // "10:30" is a time, not a course number
    let code = COURSE_CODE.captures_iter(raw).find(|caps| {
        let end = caps.get(0).map_or(raw.len(), |m| m.end());
        !NOT_DEPARTMENTS.contains(&&caps[1]) && !raw[end..].starts_with(':')
    });
    if let Some(caps) = code {
        return Some(caps[0].to_uppercase());
    }
    if let Some(m) = COURSE_PREFIX.find(&utterance.normalized) {
        return Some(m.as_str().to_uppercase());
    }
    DEPARTMENT
        .find(&utterance.normalized)
        .map(|m| m.as_str().to_uppercase())
}

// === TITLE ===

static TITLE_TASK: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)^(?:please\s+)?(?:remind me to|(?:create|add|make) (?:a\s+)?(?:new\s+)?task(?:\s+(?:to|called|named|for))?|new task(?:\s+(?:called|named))?|i need to|i have to|i must)\s+(.+?){TAIL}"
    ))
});
static TITLE_REMINDER: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)^(?:please\s+)?(?:set (?:a\s+)?reminder(?:\s+(?:to|for|about))?|remind me (?:about|of))\s+(.+?){TAIL}"
    ))
});
static TITLE_EVENT: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)^(?:please\s+)?(?:schedule|add|create|book|plan)\s+(?:an?\s+)?(?:new\s+)?(?:event|meeting|appointment|session)(?:\s+(?:called|named|for|about))?\s+(.+?){TAIL}"
    ))
});
static TITLE_CALENDAR_ADD: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^(?:please\s+)?(?:add|put)\s+(.+?)\s+(?:to|on|in)\s+(?:my\s+)?(?:calendar|schedule)\b")
});

/// Free-text title between a trigger phrase and a trailing qualifier
///
/// Only intents that create something have a title.
pub fn extract_title(utterance: &Utterance, intent: Intent) -> Option<String> {
    let patterns: &[&LazyLock<Regex>] = match intent {
        Intent::CreateTask => &[&TITLE_TASK],
        Intent::SetReminder => &[&TITLE_REMINDER, &TITLE_TASK],
        Intent::AddEvent => &[&TITLE_EVENT, &TITLE_CALENDAR_ADD],
        _ => return None,
    };
    first_capture(patterns, &utterance.raw)
}

fn first_capture(patterns: &[&LazyLock<Regex>], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| clean_segment(m.as_str()))
        .filter(|s| !s.is_empty())
}

fn clean_segment(s: &str) -> String {
    s.trim()
        .trim_matches(|c: char| matches!(c, ',' | '.' | '!' | '?' | '"' | '\''))
        .trim()
        .to_string()
}

// === TASK REFERENCES ===

static REF_COMPLETE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^(?:please\s+)?(?:mark|set)\s+(?:the\s+|my\s+)?(.+?)\s+(?:as\s+)?(?:done|complete|completed|finished)\b")
});
static REF_COMPLETE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)^(?:i\s+)?(?:complete|completed|finish|finished|done with)\s+(?:the\s+|my\s+)?(.+?){TAIL}"
    ))
});
static REF_PRIORITY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^(?:please\s+)?(?:set|make|change|mark)\s+(?:the\s+)?(?:priority\s+(?:of|for)\s+)?(?:the\s+|my\s+)?(.+?)\s+(?:to\s+|as\s+)?(?:a\s+)?(?:high|medium|low|urgent)(?:\s+priority)?\b")
});
static REF_PRIORITIZE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"(?i)^prioriti[sz]e\s+(?:the\s+|my\s+)?(.+?){TAIL}")));
static REF_UPDATE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^(?:please\s+)?(?:update|change|edit|modify)\s+(?:the\s+|my\s+)?(?:task\s+)?(.+?)(?:\s+(?:to|due|by|on|with|priority)\b.*)?[.!?]?$")
});
static REF_RESCHEDULE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^(?:please\s+)?(?:reschedule|move|postpone|push back|push)\s+(?:the\s+|my\s+)?(.+?)(?:\s+(?:to|until|till|for|on|by|back)\b.*)?[.!?]?$")
});
static REF_ESTIMATE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^(?:please\s+)?estimate\s+(?:the\s+)?(?:time\s+)?(?:for|of|needed for|to)?\s*(?:the\s+|my\s+)?(.+?)(?:\s+(?:if|when|with)\b.*)?[.!?]?$")
});
static REF_HOW_LONG: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^how long (?:will|would|does|should)\s+(?:it\s+take\s+(?:me\s+)?to\s+(?:do|finish|complete)\s+)?(?:the\s+|my\s+)?(.+?)(?:\s+take)?(?:\s+(?:if|when|with)\b.*)?\??$")
});

/// The task a command refers to, as the user phrased it
pub fn extract_task_reference(utterance: &Utterance, intent: Intent) -> Option<String> {
    let patterns: &[&LazyLock<Regex>] = match intent {
        Intent::CompleteTask => &[&REF_COMPLETE, &REF_COMPLETE_VERB],
        Intent::SetPriority => &[&REF_PRIORITY, &REF_PRIORITIZE],
        Intent::UpdateTask => &[&REF_UPDATE],
        Intent::Reschedule => &[&REF_RESCHEDULE],
        Intent::EstimateTime => &[&REF_ESTIMATE, &REF_HOW_LONG],
        _ => return None,
    };
    first_capture(patterns, &utterance.raw)
}

/// Name of a known task that matches the text
///
/// A task matches when its name and the text are case-insensitive
/// substrings of one another, in either direction. The longest matching
/// name wins; ties keep list order.
pub fn resolve_task_name(text: &str, tasks: Option<&[Task]>) -> Option<String> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    let mut best: Option<&Task> = None;
    for task in tasks? {
        let name = task.name.to_lowercase();
        if name.is_empty() || !(text.contains(&name) || name.contains(&text)) {
            continue;
        }
        if best.map_or(true, |b| task.name.len() > b.name.len()) {
            best = Some(task);
        }
    }
    best.map(|t| t.name.clone())
}

// === INTENT-SPECIFIC ===

static DIFFICULTY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(easy|simple|quick|medium|moderate|average|hard|difficult|challenging|tough)\b")
});

pub fn extract_difficulty(text: &str) -> Option<Difficulty> {
    let caps = DIFFICULTY.captures(text)?;
    Some(match &caps[1] {
        "easy" | "simple" | "quick" => Difficulty::Easy,
        "medium" | "moderate" | "average" => Difficulty::Medium,
        _ => Difficulty::Hard,
    })
}

static FOCUS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(distracted|unfocused|tired|low focus|focused|high focus|locked in|medium focus|some focus)\b")
});

pub fn extract_focus(text: &str) -> Option<FocusLevel> {
    let caps = FOCUS.captures(text)?;
    Some(match &caps[1] {
        "distracted" | "unfocused" | "tired" | "low focus" => FocusLevel::Low,
        "medium focus" | "some focus" => FocusLevel::Medium,
        _ => FocusLevel::High,
    })
}

static TIMEFRAME: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(today|tonight|tomorrow|this week|next week|this month|week|month)\b")
});

pub fn extract_timeframe(text: &str) -> Option<Timeframe> {
    let caps = TIMEFRAME.captures(text)?;
    Some(match &caps[1] {
        "today" | "tonight" => Timeframe::Today,
        "tomorrow" => Timeframe::Tomorrow,
        "next week" => Timeframe::NextWeek,
        "this month" | "month" => Timeframe::ThisMonth,
        _ => Timeframe::ThisWeek,
    })
}

static TOPIC: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(?:peers?|partners?|buddy|buddies|classmates|students|someone|people|tutors?)\s+(?:to\s+study\s+|who\s+(?:know|knows|study|studies|take|takes)\s+)?(?:for|in|with|about|on)?\s*(.+?)(?:\s+(?:on|this|next|during|in the|at|who|that|available)\b.*)?[.!?]?$")
});

/// Subject a student wants study help with
pub fn extract_topic(utterance: &Utterance) -> Option<String> {
    first_capture(&[&TOPIC], &utterance.raw)
}

static AVAILABILITY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(weekends?|weekdays?|mornings?|afternoons?|evenings?|nights?|tonight|(?:mon|tues|wednes|thurs|fri|satur|sun)days?)\b")
});

/// When a student is free, e.g. "evening", "weekend", "monday"
pub fn extract_availability(text: &str) -> Option<String> {
    let caps = AVAILABILITY.captures(text)?;
    let word = caps[1].trim_end_matches('s');
    let slot = match word {
        "morning" => TimePeriod::Morning.as_str(),
        "afternoon" => TimePeriod::Afternoon.as_str(),
        "evening" | "tonight" => TimePeriod::Evening.as_str(),
        "night" => TimePeriod::Night.as_str(),
        other => other,
    };
    Some(slot.to_string())
}

static GROUP_JOIN: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^(?:please\s+)?(?:join|enter)\s+(?:the\s+|a\s+)?(?:study\s+)?(?:group\s+)?(?:called\s+|named\s+|for\s+)?(.+?)(?:\s+(?:study\s+)?group)?[.!?]?$")
});
static GROUP_CREATE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^(?:please\s+)?(?:create|start|make|form)\s+(?:a\s+|an\s+)?(?:new\s+)?(?:study\s+)?group(?:\s+(?:called|named|for))?\s+(.+?)[.!?]?$")
});

pub fn extract_group_name(utterance: &Utterance, intent: Intent) -> Option<String> {
    match intent {
        Intent::JoinGroup => first_capture(&[&GROUP_JOIN], &utterance.raw),
        Intent::CreateGroup => first_capture(&[&GROUP_CREATE], &utterance.raw),
        _ => None,
    }
}

static SEARCH: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^(?:please\s+)?(?:search|find|look up|lookup|look for)\s+(?:for\s+)?(?:my\s+)?(.+?)[.!?]?$")
});

pub fn extract_search_query(utterance: &Utterance) -> Option<String> {
    first_capture(&[&SEARCH], &utterance.raw)
}

// === FOLLOW-UP RESIDUE ===

static RESIDUE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(?:\d{4}-\d{2}-\d{2}|(?:the\s+)?day after tomorrow|today|tonight|tomorrow|in\s+\d{1,3}\s+days?|next\s+week|(?:(?:next|this)\s+)?(?:mon|tues|wednes|thurs|fri|satur|sun)day|\d{1,2}(?::\d{2})?\s*(?:am|pm|a\.m\.|p\.m\.)|\d{1,2}:\d{2}|noon|midnight|\d+(?:\.\d+)?\s*-?\s*(?:hours?|hrs?|minutes?|mins?)|(?:high|medium|low)(?:\s+priority)?|urgent|asap)\b")
});
/// Filler words trimmed from either end of a follow-up residue
const CONNECTORS: &[&str] = &[
    "it's", "its", "it", "is", "call", "called", "named", "the", "a", "an", "and", "on", "at",
    "by", "for", "due",
];

/// Text left in a follow-up once recognised dates, times, durations and
/// priorities are removed, e.g. "Biology, Friday at 3pm" -> "Biology"
pub fn residue(utterance: &Utterance) -> Option<String> {
    let stripped = RESIDUE_NOISE.replace_all(&utterance.raw, " ");
    let cleaned: String = stripped
        .chars()
        .map(|c| if matches!(c, ',' | ';' | '.' | '!' | '?') { ' ' } else { c })
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let is_connector = |w: &&str| CONNECTORS.contains(&w.to_lowercase().as_str());
    let start = words.iter().position(|w| !is_connector(w))?;
    let end = words.iter().rposition(|w| !is_connector(w))?;
    Some(words[start..=end].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utt(s: &str) -> Utterance {
        Utterance::new(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-10-14 is a Wednesday
    const TODAY: (i32, u32, u32) = (2026, 10, 14);

    fn today() -> NaiveDate {
        date(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn test_date_literals() {
        assert_eq!(extract_date("finish it today", today()), Some(today()));
        assert_eq!(extract_date("due tomorrow", today()), Some(date(2026, 10, 15)));
        assert_eq!(extract_date("the day after tomorrow", today()), Some(date(2026, 10, 16)));
        assert_eq!(extract_date("on 2026-11-02", today()), Some(date(2026, 11, 2)));
        assert_eq!(extract_date("in 3 days", today()), Some(date(2026, 10, 17)));
        assert_eq!(extract_date("no date here", today()), None);
    }

    #[test]
    fn test_today_wins_over_other_dates() {
        assert_eq!(extract_date("today or tomorrow", today()), Some(today()));
    }

    #[test]
    fn test_weekday_resolution() {
        assert_eq!(extract_date("friday", today()), Some(date(2026, 10, 16)));
        assert_eq!(extract_date("monday", today()), Some(date(2026, 10, 19)));
        assert_eq!(extract_date("wednesday", today()), Some(today()));
        assert_eq!(extract_date("next wednesday", today()), Some(date(2026, 10, 21)));
        assert_eq!(extract_date("wednesday next week", today()), Some(date(2026, 10, 21)));
    }

    #[test]
    fn test_two_weekdays_first_wins() {
        assert_eq!(extract_date("friday or monday", today()), Some(date(2026, 10, 16)));
    }

    #[test]
    fn test_time_conversion() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(extract_time("at 3pm"), Some(t(15, 0)));
        assert_eq!(extract_time("at 9:30 am"), Some(t(9, 30)));
        assert_eq!(extract_time("12am"), Some(t(0, 0)));
        assert_eq!(extract_time("12:15pm"), Some(t(12, 15)));
        assert_eq!(extract_time("at 14:45"), Some(t(14, 45)));
        assert_eq!(extract_time("at noon"), Some(t(12, 0)));
        assert_eq!(extract_time("13pm"), None);
        assert_eq!(extract_time("no time"), None);
    }

    #[test]
    fn test_duration() {
        assert_eq!(extract_duration("a 6 hour study session"), Some(6.0));
        assert_eq!(extract_duration("2.5 hrs"), Some(2.5));
        assert_eq!(extract_duration("30 minutes"), Some(0.5));
        assert_eq!(extract_duration("45 mins"), Some(0.75));
        assert_eq!(extract_duration("a while"), None);
    }

    #[test]
    fn test_priority_buckets() {
        assert_eq!(extract_priority("this is urgent"), Some(Priority::High));
        assert_eq!(extract_priority("urgent but also low"), Some(Priority::High));
        assert_eq!(extract_priority("normal please"), Some(Priority::Medium));
        assert_eq!(extract_priority("do it whenever"), Some(Priority::Low));
        assert_eq!(extract_priority("not urgent"), Some(Priority::Low));
        assert_eq!(extract_priority("read a book"), None);
    }

    #[test]
    fn test_course_codes() {
        assert_eq!(extract_course(&utt("study for CS 101 exam")), Some("CS 101".into()));
        assert_eq!(extract_course(&utt("MATH221A homework")), Some("MATH221A".into()));
        assert_eq!(extract_course(&utt("cs 101 notes")), Some("CS 101".into()));
        assert_eq!(extract_course(&utt("biology reading")), Some("BIOLOGY".into()));
        assert_eq!(extract_course(&utt("meet at 10:30")), None);
    }

    #[test]
    fn test_task_title() {
        let title = extract_title(&utt("remind me to finish calculus homework tomorrow"), Intent::CreateTask);
        assert_eq!(title.as_deref(), Some("finish calculus homework"));

        let title = extract_title(&utt("Create task Lab Report due friday"), Intent::CreateTask);
        assert_eq!(title.as_deref(), Some("Lab Report"));

        let title = extract_title(&utt("add a task to read chapter 4"), Intent::CreateTask);
        assert_eq!(title.as_deref(), Some("read chapter 4"));
    }

    #[test]
    fn test_event_title() {
        assert_eq!(extract_title(&utt("schedule a 6 hour study session"), Intent::AddEvent), None);
        let title = extract_title(&utt("schedule a meeting called Project Sync on friday"), Intent::AddEvent);
        assert_eq!(title.as_deref(), Some("Project Sync"));
        let title = extract_title(&utt("add Biology Lab to my calendar friday"), Intent::AddEvent);
        assert_eq!(title.as_deref(), Some("Biology Lab"));
    }

    #[test]
    fn test_title_absent_for_queries() {
        assert_eq!(extract_title(&utt("what's my schedule"), Intent::ViewSchedule), None);
    }

    #[test]
    fn test_task_references() {
        let r = extract_task_reference(&utt("mark calculus homework as done"), Intent::CompleteTask);
        assert_eq!(r.as_deref(), Some("calculus homework"));
        let r = extract_task_reference(&utt("set essay to high priority"), Intent::SetPriority);
        assert_eq!(r.as_deref(), Some("essay"));
        let r = extract_task_reference(&utt("move my essay to friday"), Intent::Reschedule);
        assert_eq!(r.as_deref(), Some("essay"));
        let r = extract_task_reference(&utt("how long will my lab report take"), Intent::EstimateTime);
        assert_eq!(r.as_deref(), Some("lab report"));
    }

    #[test]
    fn test_resolve_task_name() {
        let now = today().and_hms_opt(9, 0, 0).unwrap();
        let tasks = vec![
            Task::new("Essay", today(), Priority::Low, now),
            Task::new("Calculus Homework", today(), Priority::High, now),
            Task::new("History Essay", today(), Priority::Medium, now),
        ];
        assert_eq!(
            resolve_task_name("mark calculus homework as done", Some(&tasks)).as_deref(),
            Some("Calculus Homework")
        );
        assert_eq!(
            resolve_task_name("finish the history essay", Some(&tasks)).as_deref(),
            Some("History Essay")
        );
        assert_eq!(resolve_task_name("homework", Some(&tasks)).as_deref(), Some("Calculus Homework"));
        assert_eq!(resolve_task_name("physics", Some(&tasks)), None);
        assert_eq!(resolve_task_name("essay", None), None);
    }

    #[test]
    fn test_intent_specific_extractors() {
        assert_eq!(extract_difficulty("it's pretty hard"), Some(Difficulty::Hard));
        assert_eq!(extract_focus("i'm distracted"), Some(FocusLevel::Low));
        assert_eq!(extract_focus("unfocused"), Some(FocusLevel::Low));
        assert_eq!(extract_timeframe("what's on next week"), Some(Timeframe::NextWeek));
        assert_eq!(extract_availability("free on weekends"), Some("weekend".into()));
        assert_eq!(extract_availability("evenings work"), Some("evening".into()));
    }

    #[test]
    fn test_topic_and_group_names() {
        let topic = extract_topic(&utt("find a study partner for Organic Chemistry"));
        assert_eq!(topic.as_deref(), Some("Organic Chemistry"));
        let group = extract_group_name(&utt("join the calculus study group"), Intent::JoinGroup);
        assert_eq!(group.as_deref(), Some("calculus"));
        let group = extract_group_name(&utt("create a study group called Bio Buddies"), Intent::CreateGroup);
        assert_eq!(group.as_deref(), Some("Bio Buddies"));
        let query = extract_search_query(&utt("search for midterm notes"));
        assert_eq!(query.as_deref(), Some("midterm notes"));
    }

    #[test]
    fn test_duration_longer_than_a_day_is_rejected() {
        assert_eq!(extract_duration("study for 24 hours"), Some(24.0));
        assert_eq!(extract_duration("for 10000000000000000 hours"), None);
        assert_eq!(extract_duration("a 2000 minute marathon"), None);
        assert_eq!(extract_duration("0 hours"), None);
    }

    #[test]
    fn test_capitalised_times_are_not_course_codes() {
        assert_eq!(extract_course(&utt("Schedule a meeting called Sync AT 10:30 on friday")), None);
        assert_eq!(extract_course(&utt("Meet ON 12 or later")), None);
        assert_eq!(extract_course(&utt("Lab for CHEM 101 at 10:30")).as_deref(), Some("CHEM 101"));
    }

    #[test]
    fn test_follow_up_residue() {
        assert_eq!(residue(&utt("Biology, Friday at 3pm")).as_deref(), Some("Biology"));
        assert_eq!(residue(&utt("it's called Lab Prep")).as_deref(), Some("Lab Prep"));
        assert_eq!(residue(&utt("tomorrow at 9am")), None);
        assert_eq!(residue(&utt("high priority")), None);
    }
}
