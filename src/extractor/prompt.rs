use crate::record::CompanyFacts;

/// Prompt naming the site, fixing the six-key JSON reply, and embedding the text verbatim.
pub fn build_prompt(site: &str, text: &str) -> String {
    let schema = CompanyFacts::KEYS
        .iter()
        .map(|k| format!("  \"{}\": \"...\"", k))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "Extract key company details from the following text about {site}.\n\
         Return exactly one JSON object with exactly these six keys, in this order, \
         each value a single string. Use \"Not found\" when the text does not say.\n\
         Respond only with valid JSON:\n\
         {{\n{schema}\n}}\n\n\
         Text: {text}\n"
    )
}
