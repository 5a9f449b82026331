//! 日付の書式化
//!
//! Note: 用語が多いため、このモジュールの文書は日本語で書く。
//!
//! 月名・日名・干支・六曜・二十四節気の名称と、[`Localizer`] による書式の
//! 差し替えを扱う。

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::lunisolar::Month;
use crate::lunisolar::ephemeris::normalize;

use super::era::Era;

/// 漢数字。第 `0..=9` 項が「〇」から「九」。
pub const NUM_KANJI: &[&str] = &["〇", "一", "二", "三", "四", "五", "六", "七", "八", "九"];

/// `1..=99` の数を漢数字で書く。
///
/// # 用例
///
/// ```
/// use koyomi::japanese::fmt;
///
/// assert_eq!("十", fmt::kanji_number(10));
/// assert_eq!("二十九", fmt::kanji_number(29));
/// ```
///
/// # Panics
///
/// `1..=99` 以外なら panic。
pub fn kanji_number(n: u32) -> String {
    let (tens, ones) = (n / 10, n % 10);
    let mut rt = String::new();
    match tens {
        0 => {}
        1 => rt += "十",
        2..=9 => {
            rt += NUM_KANJI[tens as usize];
            rt += "十";
        }
        _ => panic!("{} not in 1..=99", n),
    }
    if ones > 0 {
        rt += NUM_KANJI[ones as usize];
    }
    if rt.is_empty() {
        panic!("{} not in 1..=99", n);
    }
    rt
}

/// 干支の序号（1 が甲子、60 が癸亥）を名称にする。
///
/// # 用例
///
/// ```
/// use koyomi::japanese::fmt;
///
/// assert_eq!("乙巳", fmt::sexagenary(42));
/// ```
pub fn sexagenary(num: u32) -> String {
    static STEMS: &[&str] = &["癸", "甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬"];
    static BRANCHES: &[&str] = &[
        "亥", "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌",
    ];
    STEMS[num.rem_euclid(10) as usize].to_owned() + BRANCHES[num.rem_euclid(12) as usize]
}

/// 月名（「月」を含む）。一月は「正月」と書く。
///
/// # 用例
///
/// ```
/// use koyomi::japanese::fmt;
/// use koyomi::lunisolar::Month::*;
///
/// assert_eq!("正月", fmt::month(Common(1)));
/// assert_eq!("閏五月", fmt::month(Leap(5)));
/// assert_eq!("十二月", fmt::month(Common(12)));
/// ```
///
/// # Panics
///
/// 月の序号が `1..=12` 以外なら panic。
pub fn month(m: Month) -> String {
    let mut rt = String::new();
    if m.is_leap() {
        rt += "閏";
    }
    match m.num() {
        1 => rt += "正",
        num @ 2..=12 => rt += &kanji_number(num),
        num => panic!("month {} not in 1..=12", num),
    }
    rt += "月";
    rt
}

/// 日名。一日は「朔日」と書く。
///
/// # 用例
///
/// ```
/// use koyomi::japanese::fmt;
///
/// assert_eq!("朔日", fmt::day(1));
/// assert_eq!("十五日", fmt::day(15));
/// assert_eq!("三十日", fmt::day(30));
/// ```
///
/// # Panics
///
/// 日の序号が `1..=30` 以外なら panic。
pub fn day(d: u32) -> String {
    match d {
        1 => "朔日".to_owned(),
        2..=30 => kanji_number(d) + "日",
        _ => panic!("day {} not in 1..=30", d),
    }
}

/// 二十四節気の序号を名称にする。0 が春分（黄経 0°）で、以後 15° ごと。
///
/// # 用例
///
/// ```
/// use koyomi::japanese::fmt;
///
/// assert_eq!("春分", fmt::solar_term(0));
/// assert_eq!("冬至", fmt::solar_term(18));
/// ```
pub fn solar_term(index: u32) -> &'static str {
    const NAMES: &[&str] = &[
        "春分", "清明", "穀雨", "立夏", "小満", "芒種", "夏至", "小暑", "大暑", "立秋", "処暑",
        "白露", "秋分", "寒露", "霜降", "立冬", "小雪", "大雪", "冬至", "小寒", "大寒", "立春",
        "雨水", "啓蟄",
    ];
    NAMES[index.rem_euclid(24) as usize]
}

/// 太陽黄経が属する 15° 区間の序号（[`solar_term`] の序号）。
///
/// # 用例
///
/// ```
/// use koyomi::japanese::fmt;
///
/// assert_eq!(0, fmt::solar_term_index(0.0));
/// assert_eq!(18, fmt::solar_term_index(270.5));
/// assert_eq!(23, fmt::solar_term_index(-0.5));
/// ```
pub fn solar_term_index(longitude: f64) -> u32 {
    (normalize(longitude) / 15.0).floor() as u32 % 24
}

/// 六曜の序号（`(月 + 日) % 6`）を名称にする。
///
/// # 用例
///
/// ```
/// use koyomi::japanese::fmt;
///
/// assert_eq!("大安", fmt::rokuyo(0));
/// assert_eq!("先勝", fmt::rokuyo(2));
/// ```
pub fn rokuyo(index: u32) -> &'static str {
    const NAMES: &[&str] = &["大安", "赤口", "先勝", "友引", "先負", "仏滅"];
    NAMES[(index % 6) as usize]
}

/// 書式の長さ。`"F"`、`"L"`、`"M"`、`"S"` から読める。
///
/// 時刻の書式を付けた `"F-"` の形も受け付けるが、時刻は書かない。
///
/// # 用例
///
/// ```
/// use koyomi::japanese::fmt::FormatStyle;
///
/// assert_eq!(Ok(FormatStyle::Full), "F".parse());
/// assert_eq!(Ok(FormatStyle::Short), "s-".parse());
/// assert!("X".parse::<FormatStyle>().is_err());
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FormatStyle {
    Full,
    Long,
    Medium,
    Short,
}

impl FormatStyle {
    /// 書式表の鍵。
    pub fn key(self) -> &'static str {
        match self {
            FormatStyle::Full => "F",
            FormatStyle::Long => "L",
            FormatStyle::Medium => "M",
            FormatStyle::Short => "S",
        }
    }
}

impl FromStr for FormatStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let date_style = s.strip_suffix('-').unwrap_or(s);
        Ok(match date_style.to_ascii_uppercase().as_str() {
            "F" => FormatStyle::Full,
            "L" => FormatStyle::Long,
            "M" => FormatStyle::Medium,
            "S" => FormatStyle::Short,
            _ => return Err(Error::UnknownStyle(s.to_owned())),
        })
    }
}

/// 地域別の文字列の供給元。
///
/// 名前空間は次のとおり。
///
/// - `"pattern"`：書式。鍵は [`FormatStyle::key`]。`{era}`、`{year}`、
///   `{leap}`、`{month}`、`{day}`、`{rokuyo}` を置き換える。
/// - `"label"`：鍵 `"leap"` が閏月の印。
/// - `"rokuyo"`：鍵 `"0"` から `"5"`。
/// - `"era"`：鍵は元号の鍵。無ければ元号表の名称か、鍵の頭を大文字にしたもの。
///
/// 地域 `""` は既定（root）。
pub trait Localizer {
    fn lookup(&self, namespace: &str, key: &str, locale: &str) -> Option<String>;
}

/// 組み込みの文字列。日本語（`"ja"`）と既定のみ。
#[derive(Debug, Copy, Clone, Default)]
pub struct BuiltinStrings;

impl Localizer for BuiltinStrings {
    fn lookup(&self, namespace: &str, key: &str, locale: &str) -> Option<String> {
        const ROKUYO_ROMAN: &[&str] = &[
            "Taian",
            "Shakko",
            "Sensho",
            "Tomobiki",
            "Senbu",
            "Butsumetsu",
        ];
        let s = match (namespace, locale, key) {
            ("pattern", "ja", "F") => "{era}{year}年{leap}{month}月{day}日（{rokuyo}）",
            ("pattern", "ja", "L") => "{era}{year}年{leap}{month}月{day}日",
            ("pattern", "ja", "M") => "{era}{year}.{leap}{month}.{day}",
            ("pattern", "ja", "S") => "{era}{year}/{leap}{month}/{day}",
            ("pattern", "", "F") => "{era} {year}, {leap}{month}/{day} ({rokuyo})",
            ("pattern", "", "L") => "{era} {year}, {leap}{month}/{day}",
            ("pattern", "", "M") => "{era}{year}-{leap}{month}-{day}",
            ("pattern", "", "S") => "{era}{year}/{leap}{month}/{day}",
            ("label", "", "leap") => "閏",
            ("rokuyo", "ja", k) => rokuyo(k.parse().ok()?),
            ("rokuyo", "", k) => *ROKUYO_ROMAN.get(k.parse::<usize>().ok()?)?,
            _ => return None,
        };
        Some(s.to_owned())
    }
}

/// 引いた文字列の控え。鍵は `(名前空間, 鍵, 地域)`。
///
/// 呼び出し側が持ち、[`Formatter`] を通して使う。
#[derive(Debug, Clone, Default)]
pub struct StringCache {
    entries: HashMap<(String, String, String), Option<String>>,
}

impl StringCache {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// 書式化に要る値。
#[derive(Debug, Copy, Clone)]
pub struct Fields<'a> {
    pub era: Option<&'a Era>,
    pub year: i32,
    pub month: Month,
    pub day: u32,
    /// 六曜の序号
    pub rokuyo: u32,
}

/// [`Localizer`] と [`StringCache`] を束ねたもの。
///
/// # 用例
///
/// ```
/// use koyomi::japanese::era::Era;
/// use koyomi::japanese::fmt::{Fields, FormatStyle, Formatter};
/// use koyomi::lunisolar::Month::*;
///
/// let heisei = Era::new("heisei", "平成", 2447534.125, None);
/// let fields = Fields { era: Some(&heisei), year: 1, month: Leap(5), day: 29, rokuyo: 4 };
/// let mut formatter = Formatter::default();
///
/// assert_eq!("平成元年閏5月29日（先負）", formatter.format(&fields, FormatStyle::Full, "ja_JP"));
/// assert_eq!("H1/閏5/29", formatter.format(&fields, FormatStyle::Short, "ja"));
/// assert_eq!("Heisei 1, 閏5/29", formatter.format(&fields, FormatStyle::Long, "en"));
/// ```
pub struct Formatter {
    localizer: Box<dyn Localizer>,
    cache: StringCache,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(Box::new(BuiltinStrings))
    }
}

impl Formatter {
    pub fn new(localizer: Box<dyn Localizer>) -> Self {
        Self {
            localizer,
            cache: StringCache::new(),
        }
    }

    pub fn cache(&self) -> &StringCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut StringCache {
        &mut self.cache
    }

    /// 地域 `locale`、その言語部分、既定の順に引く。結果は控えに残す。
    pub fn lookup(&mut self, namespace: &str, key: &str, locale: &str) -> Option<String> {
        let cache_key = (namespace.to_owned(), key.to_owned(), locale.to_owned());
        if let Some(hit) = self.cache.entries.get(&cache_key) {
            return hit.clone();
        }
        let language = language(locale);
        let found = [locale, language, ""]
            .into_iter()
            .find_map(|l| self.localizer.lookup(namespace, key, l));
        self.cache.entries.insert(cache_key, found.clone());
        found
    }

    /// `fields` を書式 `style` で書く。
    ///
    /// 元号は長い書式（[`FormatStyle::Full`] と [`FormatStyle::Long`]）では
    /// 名称、短い書式では鍵の頭文字で書く。日本語の [`FormatStyle::Full`]
    /// では元年を「元」と書く。
    pub fn format(&mut self, fields: &Fields, style: FormatStyle, locale: &str) -> String {
        let japanese = language(locale) == "ja";
        let long = matches!(style, FormatStyle::Full | FormatStyle::Long);
        let era = match fields.era {
            Some(era) if long => self
                .lookup("era", era.key(), locale)
                .unwrap_or_else(|| {
                    if japanese {
                        era.name().to_owned()
                    } else {
                        capitalize(era.key())
                    }
                }),
            Some(era) => capitalize(era.key()).chars().take(1).collect(),
            None => String::new(),
        };
        let year = if fields.year == 1 && japanese && style == FormatStyle::Full {
            "元".to_owned()
        } else {
            fields.year.to_string()
        };
        let leap = if fields.month.is_leap() {
            self.lookup("label", "leap", locale).unwrap_or_default()
        } else {
            String::new()
        };
        let rokuyo = self
            .lookup("rokuyo", &(fields.rokuyo % 6).to_string(), locale)
            .unwrap_or_default();
        let pattern = self
            .lookup("pattern", style.key(), locale)
            .unwrap_or_else(|| "{era}{year}-{leap}{month}-{day}".to_owned());
        pattern
            .replace("{era}", &era)
            .replace("{year}", &year)
            .replace("{leap}", &leap)
            .replace("{month}", &fields.month.num().to_string())
            .replace("{day}", &fields.day.to_string())
            .replace("{rokuyo}", &rokuyo)
    }
}

fn language(locale: &str) -> &str {
    locale.split(['_', '-']).next().unwrap_or(locale)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
