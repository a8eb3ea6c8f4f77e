//! Form-input validation shared by the mutation handlers. Each check
//! returns `None` when the value is acceptable, or a user-readable
//! message. Checks other than `required` accept empty input so they can
//! be stacked on optional fields.

pub fn required(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some("This field is required".to_string())
    } else {
        None
    }
}

pub fn email(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    let invalid = Some("Invalid email format".to_string());
    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let Some(domain) = parts.next() else {
        return invalid;
    };
    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || value.chars().any(char::is_whitespace)
        || domain.contains('@')
    {
        return invalid;
    }
    None
}

pub fn min_length(min: usize, value: &str) -> Option<String> {
    if !value.is_empty() && value.chars().count() < min {
        Some(format!("Must be at least {} characters", min))
    } else {
        None
    }
}

pub fn max_length(max: usize, value: &str) -> Option<String> {
    if value.chars().count() > max {
        Some(format!("Must be at most {} characters", max))
    } else {
        None
    }
}

pub fn password(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    let mut missing: Vec<&str> = Vec::new();
    if value.chars().count() < 6 {
        missing.push("at least 6 characters");
    }
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        missing.push("one uppercase letter");
    }
    if !value.chars().any(|c| c.is_ascii_lowercase()) {
        missing.push("one lowercase letter");
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        missing.push("one number");
    }
    if missing.is_empty() {
        None
    } else {
        Some(format!("Password must contain {}", missing.join(", ")))
    }
}

pub fn numeric(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if value.trim().parse::<f64>().is_err() {
        Some("Must be a number".to_string())
    } else {
        None
    }
}

pub fn range(min: f64, max: f64, value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    let Ok(n) = value.trim().parse::<f64>() else {
        return Some("Must be a number".to_string());
    };
    if n < min || n > max {
        Some(format!("Must be between {} and {}", min, max))
    } else {
        None
    }
}

pub fn matches(other: &str, field_name: &str, value: &str) -> Option<String> {
    if value.is_empty() || other.is_empty() {
        return None;
    }
    if value != other {
        Some(format!("{} does not match", field_name))
    } else {
        None
    }
}
