/// Builds a WhatsApp click-to-chat link so the customer can reach the merchant about their order.
///
/// Everything except digits is stripped from the phone number, and a leading local `0` is replaced by the default
/// country code (`234`). Returns `None` if no usable number remains.
pub fn whatsapp_contact_link(phone: &str, message: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let international = match digits.strip_prefix('0') {
        Some(local) if !phone.trim_start().starts_with('+') => format!("234{local}"),
        _ => digits,
    };
    if international.len() < 8 {
        return None;
    }
    Some(format!("https://wa.me/{international}?text={}", urlencoding::encode(message)))
}
