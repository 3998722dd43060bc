//! Amount parsing and formatting (string-to-cents, no f64).

/// Parse a decimal amount string to i64 minor units (cents).
/// Handles "1234.56", "1234.5", "1234", "-1234.56", ".85".
pub fn parse_money_string(s: &str) -> Result<i64, String> {
    let s = s.trim();
    let negative = s.starts_with('-');
    let s = s.trim_start_matches('-');
    if s.is_empty() {
        return Err("empty amount".to_string());
    }
    let (dollars, cents) = if let Some(dot) = s.find('.') {
        let d: i64 = match &s[..dot] {
            "" => 0,
            whole => whole.parse().map_err(|e| format!("bad dollars: {}", e))?,
        };
        let frac = &s[dot + 1..];
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("bad cents: {}", frac));
        }
        let c: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|e| format!("bad cents: {}", e))? * 10,
            2 => frac.parse().map_err(|e| format!("bad cents: {}", e))?,
            _ => return Err(format!("too many decimal places: {}", s)),
        };
        (d, c)
    } else {
        (s.parse().map_err(|e| format!("bad amount: {}", e))?, 0)
    };
    let minor = dollars
        .checked_mul(100)
        .and_then(|d| d.checked_add(cents))
        .ok_or_else(|| format!("amount out of range: {}", s))?;
    Ok(if negative { -minor } else { minor })
}

/// Parse an amount as printed on a statement: strips `$` and thousands
/// separators, and reads `(12.34)` as negative.
pub fn parse_amount(token: &str) -> Result<i64, String> {
    let t = token.trim();
    let (negative, inner) = match t.strip_prefix('(').and_then(|x| x.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, t),
    };
    let cleaned: String = inner.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cents = parse_money_string(&cleaned)?;
    Ok(if negative { -cents } else { cents })
}

/// Round a float dollar amount to cents. Only for amounts that arrive as JSON
/// numbers from the fallback extractor.
pub fn cents_from_f64(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let cents = (value * 100.0).round();
    if cents.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(cents as i64)
}

/// `123456` → `"1234.56"`. Used in CSV and JSON outputs.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// `123456` → `"$1,234.56"`. Used in the HTML report.
pub fn format_dollars(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}.{:02}", sign, grouped, abs % 100)
}

/// Basis points to a percentage string: `1234` → `"12.34%"`.
pub fn format_basis_points(bp: i64) -> String {
    let sign = if bp < 0 { "-" } else { "" };
    let abs = bp.unsigned_abs();
    format!("{}{}.{:02}%", sign, abs / 100, abs % 100)
}
