//! Resource quantities as milli-units

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Parse a quantity (`500m`, `1.5`, `2Gi`, `1e3`) into milli-units
///
/// Fractions of a milli-unit round away from zero.
pub fn milli_value(quantity: &Quantity) -> Result<i64, String> {
    let raw = quantity.0.trim();
    let (negative, unsigned) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        Some(_) => (false, raw),
        None => return Err("empty quantity".to_string()),
    };

    let split = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(split);

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err("missing digits".to_string());
    }
    if fraction.contains('.') {
        return Err("more than one decimal point".to_string());
    }

    let digits = format!("{}{}", whole, fraction);
    let mantissa: i128 = digits
        .parse()
        .map_err(|_| "too many digits".to_string())?;
    let scale = fraction.len() as u32;

    let magnitude = match parse_suffix(suffix)? {
        Multiplier::Decimal(exponent) => {
            let shift = exponent + 3 - scale as i32;
            if shift >= 0 {
                pow(10, shift as u32).and_then(|m| mantissa.checked_mul(m))
            } else {
                Some(ceil_div(mantissa, pow(10, shift.unsigned_abs())))
            }
        }
        Multiplier::Binary(exponent) => pow(2, exponent)
            .and_then(|m| mantissa.checked_mul(m))
            .and_then(|v| v.checked_mul(1000))
            .map(|v| ceil_div(v, pow(10, scale))),
    }
    .ok_or_else(|| "value out of range".to_string())?;

    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).map_err(|_| "value out of range".to_string())
}

enum Multiplier {
    /// Power of ten
    Decimal(i32),
    /// Power of two
    Binary(u32),
}

fn parse_suffix(suffix: &str) -> Result<Multiplier, String> {
    let multiplier = match suffix {
        "" => Multiplier::Decimal(0),
        "m" => Multiplier::Decimal(-3),
        "k" => Multiplier::Decimal(3),
        "M" => Multiplier::Decimal(6),
        "G" => Multiplier::Decimal(9),
        "T" => Multiplier::Decimal(12),
        "P" => Multiplier::Decimal(15),
        "E" => Multiplier::Decimal(18),
        "Ki" => Multiplier::Binary(10),
        "Mi" => Multiplier::Binary(20),
        "Gi" => Multiplier::Binary(30),
        "Ti" => Multiplier::Binary(40),
        "Pi" => Multiplier::Binary(50),
        "Ei" => Multiplier::Binary(60),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))
                .and_then(|e| e.parse::<i32>().ok())
                .filter(|e| e.abs() <= 36)
                .ok_or_else(|| format!("unknown suffix {:?}", suffix))?;
            Multiplier::Decimal(exponent)
        }
    };
    Ok(multiplier)
}

fn pow(base: i128, exponent: u32) -> Option<i128> {
    base.checked_pow(exponent)
}

/// Ceiling division of a non-negative value; a divisor too large to hold
/// leaves at most one unit
fn ceil_div(value: i128, divisor: Option<i128>) -> i128 {
    match divisor {
        Some(d) => value / d + i128::from(value % d != 0),
        None => i128::from(value != 0),
    }
}
