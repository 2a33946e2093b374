use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

const OCR_EXTRACTION_TEMPLATE: &str = include_str!("prompts/ocr_extraction.md");

/// Render an inline template against `context_data`.
///
/// Autoescaping is off: prompts embed JSON verbatim.
pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered.trim_end().to_string())
}

#[derive(Serialize)]
struct OcrContext<'a> {
    schema: &'a str,
}

/// The structured-extraction instruction for an OCR request
pub fn ocr_extraction_prompt(schema: &str) -> Result<String, TeraError> {
    load_prompt(OCR_EXTRACTION_TEMPLATE, &OcrContext { schema })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_render_trims_trailing_newline() {
        let mut context = HashMap::new();
        context.insert("field", "seller_name");

        let result = load_prompt("Extract {{ field }} & nothing else.\n\n", &context).unwrap();
        assert_eq!(result, "Extract seller_name & nothing else.");
    }

    #[test]
    fn test_missing_schema_is_an_error() {
        let context: HashMap<&str, &str> = HashMap::new();
        assert!(load_prompt(OCR_EXTRACTION_TEMPLATE, &context).is_err());
    }

    #[test]
    fn test_ocr_prompt_embeds_schema_without_escaping() {
        let prompt = ocr_extraction_prompt(r#"{"name":"","items":[{"price":""}]}"#).unwrap();
        assert!(prompt.ends_with(r#"The JSON schema is: {"name":"","items":[{"price":""}]}"#));
    }
}
