/// Scoring instruction sent as the user message of the evaluation call.
///
/// The transcript is embedded verbatim; the reply shape is a contract with the
/// model and is passed back to the caller untouched.
pub fn evaluation_prompt(transcript: &str) -> String {
    format!(
        r#"
Evaluate the following spoken response for IELTS speaking on these five criteria:
1) Fluency & Coherence
2) Lexical Resource
3) Grammatical Range & Accuracy
4) Pronunciation
5) Overall band score

Provide:
- For each criterion, a numeric score on a 1-9 scale and a one-sentence justification.
- An overall band score (1-9).
- Two concrete, short improvement tips targeted to the candidate.

Transcript:
"""{transcript}"""
Respond in JSON with keys: fluency, lexical, grammar, pronunciation, overall, tips, summary

Example:
{{
 "fluency": {{"score":7, "note":"..."}},
 "lexical": {{"score":6, "note":"..."}},
 "grammar": {{"score":6, "note":"..."}},
 "pronunciation": {{"score":6, "note":"..."}},
 "overall": 6,
 "tips": ["tip1","tip2"],
 "summary": "short summary here"
}}
Be concise and return only JSON.
"#
    )
}
