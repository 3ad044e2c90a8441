/// Build the text-to-image prompt for a product background.
///
/// A blank context is treated as absent.
pub fn build_prompt(context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!(
            "Generate a professional product photo background with the following context: {context}. \
             The background should be clean, modern, and suitable for e-commerce product photography."
        ),
        None => "Generate a professional, clean, modern product photo background suitable for \
                 e-commerce. The background should be neutral and complement the product."
            .to_string(),
    }
}
