use crate::runner::Options;

pub const PLACEHOLDER: &str = "FUZZ";

// the Job struct is a single request waiting in the work queue
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub target: String,
    pub body: String,
    pub depth: usize,
}

pub fn replace_placeholder(template: &str, word: &str) -> String {
    template.replace(PLACEHOLDER, word)
}

/// Builds the seed jobs for one wordlist entry: the bare word first, then one
/// job per extension with `word + extension` substituted.
pub fn expand_word(word: &str, options: &Options) -> Vec<Job> {
    let mut out = Vec::with_capacity(1 + options.extensions.len());
    out.push(seed_job(word, options));
    for ext in options.extensions.iter() {
        let candidate = format!("{word}{ext}");
        out.push(seed_job(&candidate, options));
    }
    out
}

fn seed_job(word: &str, options: &Options) -> Job {
    Job {
        target: replace_placeholder(&options.url_template, word),
        body: replace_placeholder(&options.body_template, word),
        depth: 0,
    }
}

/// Builds the feedback batch for an accepted job. Extension variants come
/// first, followed by the plain re-submission of the same target.
pub fn expand_recursive(job: &Job, options: &Options) -> Vec<Job> {
    let depth = job.depth + 1;
    let mut out = Vec::with_capacity(1 + options.extensions.len());
    for ext in options.extensions.iter() {
        let target = format!("{}{}", job.target, ext);
        out.push(Job {
            body: replace_placeholder(&options.body_template, &target),
            target,
            depth,
        });
    }
    out.push(Job {
        target: job.target.clone(),
        body: replace_placeholder(&options.body_template, &job.target),
        depth,
    });
    out
}
