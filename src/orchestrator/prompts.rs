//! Prompt assembly for each generation step.
//!
//! Templates use `{name}` placeholders filled by the assembly functions;
//! nothing here talks to a generator. Length and count constraints live in
//! the prompts themselves, not in post-processing.

const EXPAND_TOPIC: &str = "You are preparing material for a two-person educational \
podcast.\nExpand the following answer into a conversational outline: key points, \
one or two concrete examples, and a natural closing thought.\n\nQuestion: {question}\n\n\
Answer:\n{answer}\n\nSupporting context:\n{evidence}\n\nOutline:";

const SCRIPT: &str = "Write a two-person podcast script covering the outline below. \
Use exactly two speakers labeled \"Speaker 1\" and \"Speaker 2\". Speaker 1 leads and \
explains; Speaker 2 asks questions and reacts. Keep the tone conversational, with \
natural reactions in square brackets where they fit, like [laughs] or [thoughtful].\n\n\
Return JSON of the form {\"segments\": [{\"speaker\": \"Speaker 1\", \"text\": \"...\"}]}. \
If you cannot produce JSON, label each line with the speaker name followed by a colon.\n\n\
Outline:\n{outline}\n\nSource answer:\n{answer}";

const FLASHCARDS: &str = "Create exactly {count} study flashcards from the material \
below. Each card needs a concise front (a question or term) and a back (the answer or \
definition); add a short explanation when it helps.\n\nReturn JSON of the form \
{\"title\": \"...\", \"flashcards\": [{\"front\": \"...\", \"back\": \"...\", \
\"explanation\": \"...\"}]}.\n\nMaterial:\n{answer}\n\nSupporting context:\n{evidence}";

const QUIZ: &str = "Create a multiple-choice quiz with exactly {count} questions from \
the material below. Each question needs four options, the full text of the correct \
option as correct_answer, a one-sentence explanation, and a difficulty of easy, medium, \
or hard.\n\nReturn JSON of the form {\"title\": \"...\", \"description\": \"...\", \
\"questions\": [{\"question\": \"...\", \"options\": [\"...\"], \"correct_answer\": \
\"...\", \"explanation\": \"...\", \"difficulty\": \"...\"}], \"total_points\": 0, \
\"recommended_time_minutes\": 0}.\n\nMaterial:\n{answer}\n\nSupporting context:\n{evidence}";

const ARTICLE: &str = "Write an educational article based on the material below. Start \
with a title line, then a blank line, then the body in clear prose with short \
paragraphs.\n\nMaterial:\n{answer}\n\nSupporting context:\n{evidence}";

const SHORT_POST: &str = "Write a single engaging social media post (at most \
{char_limit} characters) that teaches the key idea from the material below. No \
hashtag spam; one or two hashtags at most.\n\nMaterial:\n{answer}\n\nSupporting \
context:\n{evidence}";

pub fn expand_topic(question: &str, answer: &str, evidence: &[String]) -> String {
    EXPAND_TOPIC
        .replace("{question}", question)
        .replace("{answer}", answer)
        .replace("{evidence}", &joined(evidence))
}

pub fn script(outline: &str, answer: &str) -> String {
    SCRIPT
        .replace("{outline}", outline)
        .replace("{answer}", answer)
}

pub fn flashcards(answer: &str, evidence: &[String], count: usize) -> String {
    FLASHCARDS
        .replace("{count}", &count.to_string())
        .replace("{answer}", answer)
        .replace("{evidence}", &joined(evidence))
}

pub fn quiz(answer: &str, evidence: &[String], count: usize) -> String {
    QUIZ.replace("{count}", &count.to_string())
        .replace("{answer}", answer)
        .replace("{evidence}", &joined(evidence))
}

pub fn article(answer: &str, evidence: &[String]) -> String {
    ARTICLE
        .replace("{answer}", answer)
        .replace("{evidence}", &joined(evidence))
}

pub fn short_post(answer: &str, evidence: &[String], char_limit: usize) -> String {
    SHORT_POST
        .replace("{char_limit}", &char_limit.to_string())
        .replace("{answer}", answer)
        .replace("{evidence}", &joined(evidence))
}

fn joined(evidence: &[String]) -> String {
    evidence.join("\n\n")
}
