use crate::format::base_filename;
use crate::identity::POSITION_PREFIX;
use crate::{ParamSet, ParamValue};

/// Model type portion of a filename: the base name up to the first `-`,
/// or the whole base name when there is no hyphen.
pub fn extract_model_type(filename: &str) -> &str {
    let base = base_filename(filename);
    base.split_once('-').map_or(base, |(model_type, _)| model_type)
}

/// Escape a parameter value for embedding in an old-style filename.
/// A single left-to-right scan maps `.` to `_dot_`, `/` to `_slash_`, and
/// `\` to `_backslash_`; scanning once means already-emitted escape text is
/// never re-matched.
pub fn encode_param_value(value: &ParamValue) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '.' => out.push_str("_dot_"),
            '/' => out.push_str("_slash_"),
            '\\' => out.push_str("_backslash_"),
            other => out.push(other),
        }
    }
    out
}

/// Reverse of [`encode_param_value`] plus numeric coercion. A value
/// containing `.` is tried as a float, anything else as an integer, and
/// parse failures keep the string. A string that looks numeric therefore
/// comes back as a number; legacy filenames carry no type information, so
/// the ambiguity is inherent.
pub fn decode_param_value(raw: &str) -> ParamValue {
    let decoded = decode_escapes(raw);
    if decoded.contains('.') {
        if let Ok(value) = decoded.parse::<f64>() {
            return ParamValue::Float(value);
        }
    } else if let Ok(value) = decoded.parse::<i64>() {
        return ParamValue::Int(value);
    }
    ParamValue::Text(decoded)
}

fn decode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(ch) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("_dot_") {
            out.push('.');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("_slash_") {
            out.push('/');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("_backslash_") {
            out.push('\\');
            rest = tail;
        } else {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    out
}

/// Recover the parameter set embedded in an old-style filename. Total over
/// any input: names without a parameter section yield an empty set, and
/// `key=value` candidates that don't parse are skipped. The last occurrence
/// of a duplicate key wins.
pub fn parse_params_from_filename(filename: &str) -> ParamSet {
    let base = base_filename(filename);
    let Some((_, section)) = base.split_once('-') else {
        return ParamSet::new();
    };

    let mut params = ParamSet::new();
    for candidate in section.split('_') {
        if let Some((key, raw)) = candidate.split_once('=') {
            params.insert(key.to_string(), decode_param_value(raw));
        }
    }
    params
}

/// Emit an old-style filename: placement keys removed, entries sorted by
/// key, values escaped, joined with `_` after the `modeltype-` prefix.
pub fn legacy_model_filename(model_type: &str, params: &ParamSet) -> String {
    let section = params
        .iter()
        .filter(|(key, _)| !key.starts_with(POSITION_PREFIX))
        .map(|(key, value)| format!("{key}={}", encode_param_value(value)))
        .collect::<Vec<_>>()
        .join("_");
    format!("{model_type}-{section}")
}

#[cfg(test)]
mod tests {
    use super::{
        decode_param_value, encode_param_value, extract_model_type, legacy_model_filename,
        parse_params_from_filename,
    };
    use crate::{ParamSet, ParamValue};

    #[test]
    fn model_type_is_base_name_before_first_hyphen() {
        assert_eq!(extract_model_type("washer-abc123.obj"), "washer");
        assert_eq!(extract_model_type("plain.obj"), "plain");
        assert_eq!(extract_model_type("washer-radius=5_height=10"), "washer");
    }

    #[test]
    fn float_round_trips_through_escaping() {
        let encoded = encode_param_value(&ParamValue::Float(3.14));
        assert_eq!(encoded, "3_dot_14");
        assert_eq!(decode_param_value(&encoded), ParamValue::Float(3.14));
    }

    #[test]
    fn path_characters_round_trip_through_escaping() {
        let value = ParamValue::Text("a/b.c\\d".to_string());
        let encoded = encode_param_value(&value);
        assert_eq!(encoded, "a_slash_b_dot_c_backslash_d");
        assert_eq!(decode_param_value(&encoded), value);
    }

    #[test]
    fn decode_is_a_single_greedy_scan() {
        // Once "_dot_" is consumed, the leftover "slash_b" is literal text.
        assert_eq!(
            decode_param_value("a_dot_slash_b"),
            ParamValue::Text("a.slash_b".to_string())
        );
    }

    #[test]
    fn numeric_looking_strings_coerce_to_numbers() {
        assert_eq!(decode_param_value("42"), ParamValue::Int(42));
        assert_eq!(decode_param_value("2_dot_5"), ParamValue::Float(2.5));
        assert_eq!(
            decode_param_value("m6"),
            ParamValue::Text("m6".to_string())
        );
    }

    #[test]
    fn parses_parameter_section_with_coercion() {
        let params = parse_params_from_filename("cylinder-radius=5_height=10.obj");

        assert_eq!(params.len(), 2);
        assert_eq!(params["radius"], ParamValue::Int(5));
        assert_eq!(params["height"], ParamValue::Int(10));
    }

    #[test]
    fn name_without_parameter_section_yields_empty_set() {
        assert!(parse_params_from_filename("plain.obj").is_empty());
        // Hash-style names carry no `=` pairs either.
        assert!(parse_params_from_filename("washer-Ab3x9QkZl0.obj").is_empty());
    }

    #[test]
    fn malformed_candidates_are_skipped_and_last_duplicate_wins() {
        let params = parse_params_from_filename("part-noise_radius=5_radius=7");

        assert_eq!(params.len(), 1);
        assert_eq!(params["radius"], ParamValue::Int(7));
    }

    #[test]
    fn legacy_filename_sorts_filters_and_escapes() {
        let mut params = ParamSet::new();
        params.insert("radius".to_string(), ParamValue::Float(2.5));
        params.insert("height".to_string(), ParamValue::Int(10));
        params.insert("position_x".to_string(), ParamValue::Int(0));

        assert_eq!(
            legacy_model_filename("cylinder", &params),
            "cylinder-height=10_radius=2_dot_5"
        );
    }
}
