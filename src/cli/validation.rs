use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(n) = args.total_visible_numbers {
        if n == 0 {
            return Err("invalid total-visible-numbers, expected positive integer".to_string());
        }
    }
    if let Some(n) = args.max_results {
        if n == 0 {
            return Err("invalid max-results, expected positive integer".to_string());
        }
    }
    if let Some(page) = args.jump {
        if page == 0 {
            return Err("invalid jump page, pages start at 1".to_string());
        }
    }
    if let Some(raw) = args.by_date.as_deref() {
        if raw != "true" && raw != "false" {
            return Err(format!("invalid --by-date '{raw}', expected true or false"));
        }
    }
    if let Some(raw) = args.format.as_deref() {
        crate::output::OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --format '{raw}', expected html or json"))?;
    }
    for raw in args.attributes.iter() {
        parse_attribute(raw).map_err(|e| format!("invalid --attr '{raw}': {e}"))?;
    }
    if args.no_cache && args.cache.is_some() {
        return Err("use either --cache or --no-cache, not both".to_string());
    }
    Ok(())
}

pub fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| "expected KEY=VALUE".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("attribute name is empty".to_string());
    }
    Ok((key.to_string(), value.trim().to_string()))
}
