/// Keep only ASCII digits
pub fn only_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Mask a Brazilian phone number as it is typed.
/// Up to 10 digits: (99) 9999-9999, 11 digits: (99) 99999-9999.
/// Extra digits are dropped.
pub fn mask_phone_br(input: &str) -> String {
    let digits: String = only_digits(input).chars().take(11).collect();
    if digits.len() == 11 {
        return format!("({}) {}-{}", &digits[0..2], &digits[2..7], &digits[7..11]);
    }

    let area: String = digits.chars().take(2).collect();
    let first: String = digits.chars().skip(2).take(4).collect();
    let second: String = digits.chars().skip(6).take(4).collect();

    let mut out = String::new();
    if !area.is_empty() {
        out.push('(');
        out.push_str(&area);
        if area.len() == 2 {
            out.push(')');
        }
    }
    if !first.is_empty() {
        out.push(' ');
        out.push_str(&first);
    }
    if !second.is_empty() {
        out.push('-');
        out.push_str(&second);
    }
    out.trim().to_string()
}

/// Mask a CPF (000.000.000-00) or, past 11 digits, a CNPJ (00.000.000/0000-00)
/// as it is typed. Extra digits are dropped.
pub fn mask_cpf_cnpj(input: &str) -> String {
    let digits: String = only_digits(input).chars().take(14).collect();
    if digits.len() <= 11 {
        group_digits(&digits, &[3, 3, 3, 2], &['.', '.', '-'])
    } else {
        group_digits(&digits, &[2, 3, 3, 4, 2], &['.', '.', '/', '-'])
    }
}

/// Split `digits` into consecutive groups, emitting a separator only before
/// a group that has at least one digit.
fn group_digits(digits: &str, sizes: &[usize], separators: &[char]) -> String {
    let mut out = String::new();
    let mut rest = digits;
    for (i, size) in sizes.iter().enumerate() {
        if rest.is_empty() {
            break;
        }
        if i > 0 {
            if let Some(sep) = separators.get(i - 1) {
                out.push(*sep);
            }
        }
        let take = (*size).min(rest.len());
        out.push_str(&rest[..take]);
        rest = &rest[take..];
    }
    out
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_digits() {
        assert_eq!(only_digits("(11) 98765-4321"), "11987654321");
        assert_eq!(only_digits("abc"), "");
    }

    #[test]
    fn test_mask_phone_br_progressive() {
        assert_eq!(mask_phone_br(""), "");
        assert_eq!(mask_phone_br("1"), "(1");
        assert_eq!(mask_phone_br("11"), "(11)");
        assert_eq!(mask_phone_br("119"), "(11) 9");
        assert_eq!(mask_phone_br("119876"), "(11) 9876");
        assert_eq!(mask_phone_br("1198765"), "(11) 9876-5");
        assert_eq!(mask_phone_br("1198765432"), "(11) 9876-5432");
        assert_eq!(mask_phone_br("11987654321"), "(11) 98765-4321");
        assert_eq!(mask_phone_br("11987654321999"), "(11) 98765-4321");
        // Re-masking a masked value is stable
        assert_eq!(mask_phone_br("(11) 98765-4321"), "(11) 98765-4321");
    }

    #[test]
    fn test_mask_cpf() {
        assert_eq!(mask_cpf_cnpj("123"), "123");
        assert_eq!(mask_cpf_cnpj("1234"), "123.4");
        assert_eq!(mask_cpf_cnpj("1234567"), "123.456.7");
        assert_eq!(mask_cpf_cnpj("1234567890"), "123.456.789-0");
        assert_eq!(mask_cpf_cnpj("12345678901"), "123.456.789-01");
    }

    #[test]
    fn test_mask_cnpj() {
        assert_eq!(mask_cpf_cnpj("123456789012"), "12.345.678/9012");
        assert_eq!(mask_cpf_cnpj("1234567890123"), "12.345.678/9012-3");
        assert_eq!(mask_cpf_cnpj("12345678000199"), "12.345.678/0001-99");
        assert_eq!(mask_cpf_cnpj("12.345.678/0001-99 77"), "12.345.678/0001-99");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Conversação longa", 8), "Conve...");
    }
}
