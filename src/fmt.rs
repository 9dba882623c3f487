fn group_thousands(int_part: &str, sep: char) -> String {
    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(sep);
        }
        grouped.push(c);
    }
    grouped.chars().rev().collect()
}

/// Format a float as pesos with thousands separators: $ 1,234.56
pub fn pesos(val: f64) -> String {
    let negative = val < 0.0 && val.abs() >= 0.005;
    let fixed = format!("{:.2}", val.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let grouped = group_thousands(int_part, ',');
    if negative {
        format!("$ -{grouped}.{dec_part}")
    } else {
        format!("$ {grouped}.{dec_part}")
    }
}

/// Axis tick label: whole pesos, dot as thousands separator ($ 1.234).
pub fn pesos_tick(val: f64) -> String {
    let whole = val.trunc() as i64;
    let grouped = group_thousands(&whole.unsigned_abs().to_string(), '.');
    if whole < 0 {
        format!("$ -{grouped}")
    } else {
        format!("$ {grouped}")
    }
}

/// CSS color for a signed amount: red below zero, green above, black at zero.
pub fn sign_color(val: f64) -> &'static str {
    if val < 0.0 {
        "red"
    } else if val > 0.0 {
        "green"
    } else {
        "black"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pesos_formatting() {
        assert_eq!(pesos(1234.56), "$ 1,234.56");
        assert_eq!(pesos(-500.00), "$ -500.00");
        assert_eq!(pesos(0.0), "$ 0.00");
        assert_eq!(pesos(1000000.99), "$ 1,000,000.99");
        assert_eq!(pesos(42.10), "$ 42.10");
    }

    #[test]
    fn test_pesos_negative_rounding_to_zero() {
        assert_eq!(pesos(-0.001), "$ 0.00");
    }

    #[test]
    fn test_pesos_tick() {
        assert_eq!(pesos_tick(1234.9), "$ 1.234");
        assert_eq!(pesos_tick(1500000.0), "$ 1.500.000");
        assert_eq!(pesos_tick(0.0), "$ 0");
        assert_eq!(pesos_tick(-2500.0), "$ -2.500");
    }

    #[test]
    fn test_sign_color() {
        assert_eq!(sign_color(-1.0), "red");
        assert_eq!(sign_color(1.0), "green");
        assert_eq!(sign_color(0.0), "black");
    }
}
