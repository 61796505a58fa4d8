// Fixed instructions for summarization and answering.

pub const IMAGE_ANALYST_PROMPT: &str = "You are an experienced data analyst. You are collecting earning data of multiple companies. You will be presented with multiple contents in the format of text, tables or images. Read the metrics in the content carefully and extract the data relevant to financial performance of the company. Summarize the the content concisely.";

pub const CONTENT_SUMMARY_TEMPLATE: &str = "You are an experienced data analyst. You are collecting earning data of multiple companies. Read the metrics in the format of text and tables. carefully and summarize the tables and text relevant to financial performance of the company concisely. Table or text content are : {dataContent}";

pub const IMAGE_DESCRIBE_PROMPT: &str = "Please describe the image and summarize the content concisely";

pub const TEXT_ANSWER_TEMPLATE: &str = "Answer the question based only on the following context, which can include text and tables:\n{context}\n\nQuestion: {question}";

pub const IMAGE_ANSWER_PROMPT: &str = "Extract the information from the image and answer the question only based on extracted information. Summarize the answer concisely and output the content in the format of markdown. \n\nQuestion: ";

/// Substitutes `{name}` placeholders in one pass, so substituted values are
/// never expanded again. Unknown placeholders are left as is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = &after[..end];
        match vars.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 2]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

pub fn content_summary_prompt(content: &str) -> String {
    render(CONTENT_SUMMARY_TEMPLATE, &[("dataContent", content)])
}

pub fn text_answer_prompt(context: &str, question: &str) -> String {
    render(TEXT_ANSWER_TEMPLATE, &[("context", context), ("question", question)])
}

pub fn image_answer_prompt(question: &str) -> String {
    format!("{}{}", IMAGE_ANSWER_PROMPT, question)
}
