use crate::error::FundWarnCode;

#[derive(Debug, Clone, Copy)]
pub struct WarnEvent<'a> {
    pub code: FundWarnCode,
    pub stage: &'a str,
    pub action: &'a str,
    pub reason: &'a str,
    pub err: &'a str,
}

fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() && !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else if !ch.is_control() {
            out.push(ch);
            prev_sep = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "na".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn format_line(event: &WarnEvent<'_>) -> String {
    format!(
        "FUND_WARN code={} stage={} action={} reason={} err={}",
        event.code.as_str(),
        sanitize_value(event.stage),
        sanitize_value(event.action),
        sanitize_value(event.reason),
        sanitize_value(event.err),
    )
}

/// Report a degradation that the sync layer absorbed instead of failing.
pub fn emit(event: WarnEvent<'_>) {
    log::warn!("{}", format_line(&event));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_value_rewrites_whitespace() {
        assert_eq!(sanitize_value("a b\tc"), "a_b_c");
    }

    #[test]
    fn sanitize_value_falls_back_for_empty() {
        assert_eq!(sanitize_value("   "), "na");
    }

    #[test]
    fn format_line_is_single_line_key_values() {
        let line = format_line(&WarnEvent {
            code: FundWarnCode::RemoteWriteFailed,
            stage: "remote",
            action: "write-document",
            reason: "http status",
            err: "503 Service\nUnavailable",
        });
        assert_eq!(
            line,
            "FUND_WARN code=W006_REMOTE_WRITE_FAILED stage=remote action=write-document reason=http_status err=503_Service_Unavailable"
        );
        assert!(!line.contains('\n'));
    }
}
