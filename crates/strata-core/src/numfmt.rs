//! Numeric tick formats in the d3-format mini-language
//!
//! Supported: `[[fill]align][sign][$][0][width][,][.precision][~][type]`
//! with types `e f g r s % p d n` or none.

use crate::{ChartError, ChartResult};

const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Align {
    Left,
    #[default]
    Right,
    Center,
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SignMode {
    #[default]
    Minus,
    Plus,
    Space,
    Parens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Exponent,
    Fixed,
    General,
    Rounded,
    Si,
    Percent,
    PercentRounded,
    Integer,
}

/// Parsed number format specifier
#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    fill: char,
    align: Align,
    sign: SignMode,
    currency: bool,
    zero: bool,
    width: Option<usize>,
    comma: bool,
    precision: usize,
    trim: bool,
    kind: Kind,
}

impl NumberFormat {
    pub fn parse(spec: &str) -> ChartResult<Self> {
        let fail = |reason: &str| ChartError::InvalidFormat {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let chars: Vec<char> = spec.chars().collect();
        let mut i = 0;

        let mut fill = ' ';
        let mut align = Align::Right;
        let as_align = |c: char| match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            '=' => Some(Align::AfterSign),
            _ => None,
        };

        if let Some(a) = chars.get(1).and_then(|&c| as_align(c)) {
            fill = chars[0];
            align = a;
            i = 2;
        } else if let Some(a) = chars.first().and_then(|&c| as_align(c)) {
            align = a;
            i = 1;
        }

        let mut sign = SignMode::Minus;
        if let Some(&c) = chars.get(i) {
            let mode = match c {
                '-' => Some(SignMode::Minus),
                '+' => Some(SignMode::Plus),
                ' ' => Some(SignMode::Space),
                '(' => Some(SignMode::Parens),
                _ => None,
            };
            if let Some(mode) = mode {
                sign = mode;
                i += 1;
            }
        }

        let mut currency = false;
        match chars.get(i) {
            Some('$') => {
                currency = true;
                i += 1;
            }
            Some('#') => i += 1,
            _ => {}
        }

        let mut zero = false;
        if chars.get(i) == Some(&'0') {
            zero = true;
            i += 1;
        }

        let width = take_digits(&chars, &mut i);

        let mut comma = false;
        if chars.get(i) == Some(&',') {
            comma = true;
            i += 1;
        }

        let mut precision = None;
        if chars.get(i) == Some(&'.') {
            i += 1;
            precision = Some(take_digits(&chars, &mut i).ok_or_else(|| fail("precision needs digits"))?);
        }

        let mut trim = false;
        if chars.get(i) == Some(&'~') {
            trim = true;
            i += 1;
        }

        let kind = match chars.get(i) {
            None => None,
            Some(&c) => {
                i += 1;
                Some(match c {
                    'e' => Kind::Exponent,
                    'f' => Kind::Fixed,
                    'g' => Kind::General,
                    'r' => Kind::Rounded,
                    's' => Kind::Si,
                    '%' => Kind::Percent,
                    'p' => Kind::PercentRounded,
                    'd' => Kind::Integer,
                    'n' => {
                        comma = true;
                        Kind::General
                    }
                    _ => return Err(fail("unsupported format type")),
                })
            }
        };

        if i != chars.len() {
            return Err(fail("unexpected trailing characters"));
        }

        let kind = match kind {
            Some(kind) => kind,
            None => {
                trim = true;
                precision = precision.or(Some(12));
                Kind::General
            }
        };

        let precision = match kind {
            Kind::General | Kind::Rounded | Kind::Si | Kind::PercentRounded => {
                precision.unwrap_or(6).clamp(1, 21)
            }
            _ => precision.unwrap_or(6).min(20),
        };

        if zero || (fill == '0' && align == Align::AfterSign) {
            zero = true;
            fill = '0';
            align = Align::AfterSign;
        }

        Ok(Self {
            fill,
            align,
            sign,
            currency,
            zero,
            width,
            comma,
            precision,
            trim,
            kind,
        })
    }

    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }

        let abs = value.abs();
        let p = self.precision;

        let (mut body, mut suffix) = match self.kind {
            Kind::Exponent => (exponential(abs, p), String::new()),
            Kind::Fixed => (format!("{:.*}", p, abs), String::new()),
            Kind::General => (to_precision(abs, p), String::new()),
            Kind::Rounded => (rounded(abs, p), String::new()),
            Kind::Si => {
                let (body, prefix) = si(abs, p);
                (body, prefix.to_string())
            }
            Kind::Percent => (format!("{:.*}", p, abs * 100.0), "%".to_string()),
            Kind::PercentRounded => (rounded(abs * 100.0, p), "%".to_string()),
            Kind::Integer => (format!("{}", abs.round()), String::new()),
        };

        if self.trim {
            body = trim_insignificant(&body);
        }

        // -0 and values that round to zero carry no sign
        let negative = value < 0.0 && body.chars().any(|c| matches!(c, '1'..='9'));

        let mut prefix = match (self.sign, negative) {
            (SignMode::Parens, true) => "(".to_string(),
            (_, true) => "-".to_string(),
            (SignMode::Plus, false) => "+".to_string(),
            (SignMode::Space, false) => " ".to_string(),
            _ => String::new(),
        };
        if self.currency {
            prefix.push('$');
        }
        if self.sign == SignMode::Parens && negative {
            suffix.push(')');
        }

        if self.zero {
            if let Some(width) = self.width {
                let used = prefix.chars().count() + suffix.chars().count();
                let target = width.saturating_sub(used);
                let len = body.chars().count();
                if len < target {
                    body = format!("{}{}", "0".repeat(target - len), body);
                }
            }
        }

        if self.comma {
            body = group_thousands(&body);
        }

        let len = prefix.chars().count() + body.chars().count() + suffix.chars().count();
        let pad_len = self.width.map_or(0, |w| w.saturating_sub(len));
        let pad: String = std::iter::repeat_n(self.fill, pad_len).collect();

        match self.align {
            Align::Left => format!("{prefix}{body}{suffix}{pad}"),
            Align::Right => format!("{pad}{prefix}{body}{suffix}"),
            Align::AfterSign => format!("{prefix}{pad}{body}{suffix}"),
            Align::Center => {
                let half = pad_len / 2;
                let left: String = pad.chars().take(half).collect();
                let right: String = pad.chars().skip(half).collect();
                format!("{left}{prefix}{body}{suffix}{right}")
            }
        }
    }
}

impl std::str::FromStr for NumberFormat {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn take_digits(chars: &[char], i: &mut usize) -> Option<usize> {
    let start = *i;
    while chars.get(*i).is_some_and(|c| c.is_ascii_digit()) {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    chars[start..*i].iter().collect::<String>().parse().ok()
}

/// Decimal exponent of `v` after rounding to `digits` fractional digits of
/// scientific notation
fn sci_exponent(v: f64, digits: usize) -> i32 {
    let s = format!("{:.*e}", digits, v);
    s.split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0)
}

fn exponential(v: f64, digits: usize) -> String {
    let s = format!("{:.*e}", digits, v);
    match s.split_once('e') {
        Some((mantissa, exp)) if exp.starts_with('-') => format!("{mantissa}e{exp}"),
        Some((mantissa, exp)) => format!("{mantissa}e+{exp}"),
        None => s,
    }
}

/// `Number.prototype.toPrecision`
fn to_precision(v: f64, p: usize) -> String {
    let e = sci_exponent(v, p - 1);
    if e < -6 || e >= p as i32 {
        exponential(v, p - 1)
    } else {
        let decimals = (p as i32 - 1 - e).max(0) as usize;
        format!("{:.*}", decimals, v)
    }
}

/// `p` significant digits, always in fixed notation
fn rounded(v: f64, p: usize) -> String {
    let e = sci_exponent(v, p - 1);
    let decimals = p as i32 - 1 - e;
    if decimals > 0 {
        format!("{:.*}", decimals as usize, v)
    } else {
        let factor = 10f64.powi(-decimals);
        format!("{:.0}", (v / factor).round() * factor)
    }
}

fn si(v: f64, p: usize) -> (String, &'static str) {
    let e = sci_exponent(v, p - 1);
    let group = e.div_euclid(3).clamp(-8, 8);
    let scaled = v / 10f64.powi(group * 3);
    (rounded(scaled, p), SI_PREFIXES[(group + 8) as usize])
}

fn trim_insignificant(s: &str) -> String {
    let (number, exponent) = match s.find('e') {
        Some(i) => s.split_at(i),
        None => (s, ""),
    };
    if !number.contains('.') {
        return s.to_string();
    }
    let trimmed = number.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}{exponent}")
}

fn group_thousands(s: &str) -> String {
    let split = s.find(['.', 'e']).unwrap_or(s.len());
    let (int_part, rest) = s.split_at(split);

    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::with_capacity(s.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(spec: &str, v: f64) -> String {
        NumberFormat::parse(spec).unwrap().format(v)
    }

    #[test]
    fn test_fixed_and_grouping() {
        assert_eq!(fmt(",.0f", 1_234_567.0), "1,234,567");
        assert_eq!(fmt(".2f", 3.14159), "3.14");
        assert_eq!(fmt("$,.2f", 1234.5), "$1,234.50");
        assert_eq!(fmt(",", 1234.5), "1,234.5");
    }

    #[test]
    fn test_default_type_trims() {
        assert_eq!(fmt("", 0.5), "0.5");
        assert_eq!(fmt("", 42.0), "42");
    }

    #[test]
    fn test_si_prefixes() {
        assert_eq!(fmt(".2s", 1500.0), "1.5k");
        assert_eq!(fmt(".3s", 0.5), "500m");
        assert_eq!(fmt(".3~s", 1000.0), "1k");
        assert_eq!(fmt("~s", 2_500_000.0), "2.5M");
    }

    #[test]
    fn test_percent_and_exponent() {
        assert_eq!(fmt(".1%", 0.123), "12.3%");
        assert_eq!(fmt(".0%", 0.5), "50%");
        assert_eq!(fmt("e", 1234.0), "1.234000e+3");
        assert_eq!(fmt(".1e", 0.00012), "1.2e-4");
    }

    #[test]
    fn test_signs_and_padding() {
        assert_eq!(fmt("+.2f", 3.0), "+3.00");
        assert_eq!(fmt("(.1f", -2.0), "(2.0)");
        assert_eq!(fmt("08.2f", -3.14159), "-0003.14");
        assert_eq!(fmt(">8d", 42.0), "      42");
        assert_eq!(fmt("^7d", 42.0), "  42   ");
        assert_eq!(fmt("*<5d", 7.0), "7****");
    }

    #[test]
    fn test_negative_zero_has_no_sign() {
        assert_eq!(fmt(".1f", -0.01), "0.0");
    }

    #[test]
    fn test_rejects_invalid_specs() {
        assert!(NumberFormat::parse(".f2").is_err());
        assert!(NumberFormat::parse("x").is_err());
        assert!(NumberFormat::parse(".2fz").is_err());
    }
}
