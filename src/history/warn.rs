fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_ascii_whitespace() {
            if !out.is_empty() && !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else if ch.is_ascii_graphic() {
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

#[derive(Debug, Clone, Copy)]
pub struct WarnEvent<'a> {
    pub code: &'a str,
    pub stage: &'a str,
    pub archive: &'a str,
    pub source: &'a str,
    pub reason: &'a str,
}

pub fn render(event: &WarnEvent<'_>) -> String {
    format!(
        "AGS_HISTORY_WARN code={} stage={} archive={} source={} reason={}",
        sanitize_value(event.code),
        sanitize_value(event.stage),
        sanitize_value(event.archive),
        sanitize_value(event.source),
        sanitize_value(event.reason),
    )
}

pub fn emit(event: WarnEvent<'_>) {
    tracing::warn!("{}", render(&event));
}

#[cfg(test)]
mod tests {
    use super::{WarnEvent, render, sanitize_value};

    #[test]
    fn sanitize_value_rewrites_whitespace() {
        assert_eq!(sanitize_value("a b\tc"), "a_b_c");
    }

    #[test]
    fn sanitize_value_falls_back_for_empty() {
        assert_eq!(sanitize_value("   "), "na");
    }

    #[test]
    fn render_keeps_one_token_per_field() {
        let line = render(&WarnEvent {
            code: "KEY_COLLISION",
            stage: "scan",
            archive: "ags_23.zip",
            source: "data/old copy/ags_23.zip",
            reason: "",
        });
        assert_eq!(
            line,
            "AGS_HISTORY_WARN code=KEY_COLLISION stage=scan archive=ags_23.zip source=data/old_copy/ags_23.zip reason=na"
        );
    }
}
