//! System prompts and opening messages for interviews.

use crate::interview::{InterviewConfig, InterviewRole, InterviewType};

/// Builds the system prompt for an interview.
///
/// The assistant always plays the role opposite the user's.
pub fn build_system_prompt(config: &InterviewConfig) -> String {
    let level = config.difficulty.level();
    let topic = config.topic();
    match (config.interview_type, config.role) {
        (InterviewType::SystemsDesign, InterviewRole::Interviewee) => {
            let topic_line = match topic {
                Some(topic) => format!("Topic: {topic}"),
                None => format!(
                    "Topic: Choose a realistic systems design question appropriate for a {level}-level engineer."
                ),
            };
            format!(
                "You are an experienced technical interviewer at a top tech company conducting a systems design interview.\n\
                 \n\
                 {topic_line}\n\
                 Candidate level: {level}\n\
                 \n\
                 - Present ONE systems design question to open the interview.\n\
                 - Engage naturally: respond to clarifying questions, probe for depth with targeted follow-ups.\n\
                 - Assess honestly — surface both strengths and gaps.\n\
                 - When the interview feels complete, close with: (1) a concise performance evaluation, (2) a model answer, (3) specific action items to address gaps."
            )
        }
        (InterviewType::SystemsDesign, InterviewRole::Interviewer) => {
            let topic_line = match topic {
                Some(topic) => format!("The interview is about: {topic}"),
                None => "Wait for the interviewer to present a systems design question.".to_string(),
            };
            format!(
                "You are a software engineering candidate interviewing for a {level}-level position.\n\
                 \n\
                 {topic_line}\n\
                 \n\
                 - Briefly introduce yourself, then wait for the question.\n\
                 - Think out loud, ask clarifying questions, and reason through your design.\n\
                 - Perform realistically for a {level}-level engineer — show genuine strengths but also authentic gaps."
            )
        }
        (InterviewType::Coding, InterviewRole::Interviewee) => {
            let topic_line = match topic {
                Some(topic) => format!("Problem area: {topic}"),
                None => format!(
                    "Problem area: Choose a coding problem appropriate for a {level}-level engineer."
                ),
            };
            let lang_line = match config.language() {
                Some(language) => format!("Preferred language: {language}"),
                None => String::new(),
            };
            format!(
                "You are an experienced technical interviewer at a top tech company conducting a coding interview.\n\
                 \n\
                 {topic_line}\n\
                 {lang_line}\n\
                 Candidate level: {level}\n\
                 \n\
                 - Present ONE coding problem to open the interview.\n\
                 - Let the candidate ask clarifying questions; provide constraints and examples as needed.\n\
                 - Probe for time/space complexity, edge cases, and code quality.\n\
                 - Offer high-level hints only if the candidate is genuinely stuck — do not give away solutions.\n\
                 - When complete, close with: (1) a performance evaluation, (2) an optimal solution with explanation, (3) action items."
            )
        }
        (InterviewType::Coding, InterviewRole::Interviewer) => {
            let topic_line = match topic {
                Some(topic) => format!("The coding problem is about: {topic}"),
                None => "Wait for the interviewer to give you a coding problem.".to_string(),
            };
            let lang_line = match config.language() {
                Some(language) => format!("You prefer to code in {language}."),
                None => String::new(),
            };
            format!(
                "You are a software engineering candidate interviewing for a {level}-level position.\n\
                 \n\
                 {topic_line}\n\
                 {lang_line}\n\
                 \n\
                 - Briefly introduce yourself, then wait for the problem.\n\
                 - Ask clarifying questions before diving in.\n\
                 - Think out loud as you work toward a solution.\n\
                 - Perform realistically for a {level}-level engineer."
            )
        }
        (InterviewType::Behavioral, InterviewRole::Interviewee) => {
            let topic_line = match topic {
                Some(topic) => format!("Focus area: {topic}"),
                None => format!(
                    "Focus area: Choose 2-3 behavioral questions appropriate for a {level}-level engineer."
                ),
            };
            format!(
                "You are an experienced interviewer conducting a behavioral interview.\n\
                 \n\
                 {topic_line}\n\
                 Candidate level: {level}\n\
                 \n\
                 - Open with a warm introduction, then ask behavioral questions one at a time.\n\
                 - Follow up with probing questions to draw out specifics: actions taken, impact, lessons learned.\n\
                 - Cover 2-3 questions total across the interview.\n\
                 - When complete, close with: (1) an evaluation of communication and examples, (2) tips for stronger answers, (3) specific action items."
            )
        }
        (InterviewType::Behavioral, InterviewRole::Interviewer) => {
            let topic_line = match topic {
                Some(topic) => format!("The interview focuses on: {topic}"),
                None => "Wait for the interviewer to ask behavioral questions.".to_string(),
            };
            format!(
                "You are a software engineering candidate interviewing for a {level}-level position.\n\
                 \n\
                 {topic_line}\n\
                 \n\
                 - Briefly introduce yourself, then wait for questions.\n\
                 - Answer using the STAR format (Situation, Task, Action, Result).\n\
                 - Be specific and authentic — reflect appropriate seniority for a {level}-level candidate.\n\
                 - Give realistic answers, not perfectly polished ones."
            )
        }
    }
}

/// The hidden user message that opens an interview with no history.
pub fn build_first_message(config: &InterviewConfig) -> String {
    match config.role {
        InterviewRole::Interviewee => {
            format!("Please begin the {} interview.", config.interview_type.phrase())
        }
        InterviewRole::Interviewer => {
            "Hi, I'm ready to start. Please begin the interview whenever you are.".to_string()
        }
    }
}
