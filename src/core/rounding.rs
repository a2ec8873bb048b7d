use crate::utils::error::RoundingError;

/// Rounds `value` to `keep_digits` leading digits, half-to-even.
///
/// Only the digit right after the kept prefix takes part in the decision:
/// everything below it is zeroed first, so `24553` with two digits sees
/// `24500` and rounds down to the even `24000`.
pub fn bank_round(value: u64, keep_digits: usize) -> Result<u64, RoundingError> {
    let invalid = |reason: &str| RoundingError::InvalidArgument {
        value,
        keep_digits,
        reason: reason.to_string(),
    };

    if keep_digits == 0 {
        return Err(invalid("keep_digits must be at least 1"));
    }

    let digits = value.to_string();
    let len = digits.len();
    if keep_digits >= len {
        return Ok(value);
    }

    let dropped = len - keep_digits;
    // 10^dropped fits: dropped < len <= 20
    let unit = 10u64.pow(dropped as u32);

    let kept: u64 = digits[..keep_digits]
        .parse()
        .map_err(|_| invalid("value is not a decimal integer"))?;
    let next_digit = u64::from(digits.as_bytes()[keep_digits] - b'0');

    let round_up = match next_digit {
        0..=4 => false,
        6..=9 => true,
        // 5: half to even
        _ => kept % 2 == 1,
    };

    let quotient = if round_up { kept + 1 } else { kept };
    quotient
        .checked_mul(unit)
        .ok_or_else(|| invalid("rounded value overflows u64"))
}

/// `22000` -> `22,000`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
