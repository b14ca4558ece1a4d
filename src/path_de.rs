use serde::de::DeserializeOwned;

use crate::error::{Result, TranslateError};

/// Deserialize a JSON tree; shape errors name the JSON path of the bad node.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let mut de = serde_json::Deserializer::from_str(src);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(malformed)?;
    de.end().map_err(|err| TranslateError::MalformedTree {
        path: ".".to_string(),
        message: err.to_string(),
    })?;
    Ok(value)
}

pub fn from_value_with_path<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(malformed)
}

fn malformed(err: serde_path_to_error::Error<serde_json::Error>) -> TranslateError {
    let path = err.path().to_string();
    TranslateError::MalformedTree { path, message: err.into_inner().to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Mojom;

    #[test]
    fn trailing_garbage_is_malformed() {
        let err = from_str_with_path::<Mojom>(r#"{"import_list": [], "definition_list": []} x"#)
            .unwrap_err();
        assert_eq!(err.class(), "MalformedTree");
    }

    #[test]
    fn wrong_json_type_reports_member_path() {
        let err = from_str_with_path::<Mojom>(r#"{"import_list": {}, "definition_list": []}"#)
            .unwrap_err();
        match err {
            TranslateError::MalformedTree { path, .. } => assert_eq!(path, "import_list"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn syntax_errors_are_malformed_too() {
        let err = from_str_with_path::<Mojom>("{").unwrap_err();
        assert_eq!(err.class(), "MalformedTree");
    }
}
