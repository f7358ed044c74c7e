use std::collections::HashSet;
use std::io::Write;
use std::time::Duration;

use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::runner::{FuzzResult, Options, Runner, ScanReport};
use crate::wordlist::WordlistSource;

fn inline(words: &[&str]) -> WordlistSource {
    WordlistSource::Inline(words.iter().map(|w| w.to_string()).collect())
}

fn options(server: &MockServer, template: &str, words: &[&str]) -> Options {
    Options {
        url_template: format!("{}{}", server.uri(), template),
        wordlist: inline(words),
        workers: 4,
        retry_delay: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
        ..Options::default()
    }
}

async fn run(options: Options) -> ScanReport {
    crate::logging::init_for_tests();
    Runner::new(options).unwrap().run().await.unwrap()
}

fn paths(server: &MockServer, results: &[FuzzResult]) -> Vec<String> {
    let mut out: Vec<String> = results
        .iter()
        .map(|r| r.target.trim_start_matches(&server.uri()).to_string())
        .collect();
    out.sort();
    out
}

async fn not_found_everywhere(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[tokio::test]
async fn seeds_cover_every_word_and_extension() {
    let server = MockServer::start().await;
    not_found_everywhere(&server).await;

    let mut opts = options(&server, "/FUZZ", &["a", "b", "c"]);
    opts.extensions = vec![".php".to_string(), ".bak".to_string()];
    let report = run(opts).await;

    assert_eq!(report.summary.seeded, 9);
    assert_eq!(report.summary.dispatched, 9);
    assert_eq!(report.results.len(), 9);
    assert!(report.results.iter().all(|r| r.status == Some(404)));
}

#[tokio::test]
async fn admin_login_with_php_extension() {
    let server = MockServer::start().await;
    not_found_everywhere(&server).await;

    let mut opts = options(&server, "/FUZZ", &["admin", "login"]);
    opts.extensions = vec![".php".to_string()];
    let report = run(opts).await;

    assert_eq!(
        paths(&server, &report.results),
        vec!["/admin", "/admin.php", "/login", "/login.php"]
    );
}

#[tokio::test]
async fn wordlist_file_feeds_the_scan() {
    let server = MockServer::start().await;
    not_found_everywhere(&server).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "admin\n\n\nlogin\n").unwrap();
    let mut opts = options(&server, "/FUZZ", &[]);
    opts.wordlist = WordlistSource::FilePath(file.path().to_string_lossy().to_string());
    let report = run(opts).await;

    assert_eq!(paths(&server, &report.results), vec!["/admin", "/login"]);
}

#[tokio::test]
async fn non_utf8_wordlist_lines_are_still_scanned() {
    let server = MockServer::start().await;
    not_found_everywhere(&server).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"admin\ncaf\xe9\nlogin\nbackup\n").unwrap();
    let mut opts = options(&server, "/FUZZ", &[]);
    opts.wordlist = WordlistSource::FilePath(file.path().to_string_lossy().to_string());
    let report = run(opts).await;

    assert_eq!(report.summary.seeded, 4);
    assert_eq!(report.summary.dispatched, 4);
    assert_eq!(
        paths(&server, &report.results),
        vec!["/admin", "/backup", "/caf\u{FFFD}", "/login"]
    );
}

#[tokio::test]
async fn repeated_extensions_each_seed_a_job() {
    let server = MockServer::start().await;
    not_found_everywhere(&server).await;

    let mut opts = options(&server, "/FUZZ", &["a", "b"]);
    opts.extensions = crate::utils::parse_extensions_csv(".php,.php").unwrap();
    let report = run(opts).await;

    assert_eq!(report.summary.seeded, 6);
    assert_eq!(report.summary.dispatched, 6);
}

#[tokio::test]
async fn status_filter_keeps_only_allowed_codes() {
    let server = MockServer::start().await;
    Mock::given(path("/admin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("panel"))
        .mount(&server)
        .await;
    not_found_everywhere(&server).await;

    let mut opts = options(&server, "/FUZZ", &["admin", "login", "backup"]);
    opts.status_filter = HashSet::from([200]);
    let report = run(opts).await;

    assert_eq!(report.results.len(), 1);
    assert_eq!(paths(&server, &report.results), vec!["/admin"]);
    assert_eq!(report.results[0].status, Some(200));
    assert_eq!(report.results[0].length, 5);
    assert_eq!(report.summary.filtered, 2);
}

#[tokio::test]
async fn body_regex_selects_matching_pages() {
    let server = MockServer::start().await;
    Mock::given(path("/admin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>welcome admin</p>"))
        .mount(&server)
        .await;
    Mock::given(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>please log in</p>"))
        .mount(&server)
        .await;

    let mut opts = options(&server, "/FUZZ", &["admin", "login"]);
    opts.body_regex = Some("welcome".to_string());
    let report = run(opts).await;

    assert_eq!(paths(&server, &report.results), vec!["/admin"]);
}

#[tokio::test]
async fn min_length_drops_short_bodies() {
    let server = MockServer::start().await;
    for (p, body) in [("/a", "x"), ("/b", "xxxxx"), ("/c", "xxxxxxxxxx"), ("/d", "")] {
        Mock::given(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }

    let mut opts = options(&server, "/FUZZ", &["a", "b", "c", "d"]);
    opts.min_length = 5;
    let report = run(opts).await;

    assert_eq!(paths(&server, &report.results), vec!["/b", "/c"]);
    assert!(report.results.iter().all(|r| r.length >= 5));
}

#[tokio::test]
async fn unreachable_target_yields_one_error_result() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let opts = Options {
        url_template: format!("http://{addr}/FUZZ"),
        wordlist: inline(&["admin"]),
        retries: 2,
        retry_delay: Duration::from_millis(1),
        status_filter: HashSet::from([200]),
        ..Options::default()
    };
    let report = run(opts).await;

    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert!(result.is_error());
    assert_eq!(result.status, None);
    assert_eq!(result.length, 0);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .starts_with("request failed after 3 attempt(s)"));
    assert_eq!(report.summary.errors, 1);
}

#[tokio::test]
async fn recursion_dispatches_each_target_once() {
    let server = MockServer::start().await;
    Mock::given(path("/admin"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut opts = options(&server, "/FUZZ", &["admin", "admin", "admin"]);
    opts.recursive = true;
    opts.max_depth = 3;
    let report = run(opts).await;

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.summary.dispatched, 1);
    // two repeated seeds plus the plain re-submission
    assert_eq!(report.summary.duplicates, 3);
}

#[tokio::test]
async fn without_recursion_repeated_words_are_sent_again() {
    let server = MockServer::start().await;
    Mock::given(path("/admin"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let report = run(options(&server, "/FUZZ", &["admin", "admin"])).await;
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.summary.duplicates, 0);
}

#[tokio::test]
async fn depth_one_allows_a_single_feedback_batch() {
    let server = MockServer::start().await;
    Mock::given(path("/admin/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(path("/admin/.php"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    not_found_everywhere(&server).await;

    let mut opts = options(&server, "/FUZZ/", &["admin"]);
    opts.extensions = vec![".php".to_string()];
    opts.status_filter = HashSet::from([200]);
    opts.recursive = true;
    opts.max_depth = 1;
    let report = run(opts).await;

    let mut found: Vec<(String, usize)> = report
        .results
        .iter()
        .map(|r| (r.target.trim_start_matches(&server.uri()).to_string(), r.depth))
        .collect();
    found.sort();
    assert_eq!(
        found,
        vec![("/admin/".to_string(), 0), ("/admin/.php".to_string(), 1)]
    );
    // only the depth 0 hit fed the queue: one extension job and one plain job
    assert_eq!(report.summary.recursive_jobs, 2);
    assert_eq!(report.summary.duplicates, 1);
    assert_eq!(report.summary.dispatched, 3);
}

#[tokio::test]
async fn recursion_never_goes_past_max_depth() {
    let server = MockServer::start().await;
    Mock::given(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut opts = options(&server, "/FUZZ/", &["a"]);
    opts.extensions = vec![".x".to_string()];
    opts.recursive = true;
    opts.max_depth = 2;
    let report = run(opts).await;

    assert_eq!(
        paths(&server, &report.results),
        vec!["/a.x/", "/a.x/.x", "/a.x/.x.x", "/a/", "/a/.x", "/a/.x.x"]
    );
    assert_eq!(report.results.iter().map(|r| r.depth).max(), Some(2));
    assert_eq!(report.summary.dispatched, 6);
    assert_eq!(report.summary.duplicates, 4);
}

#[tokio::test]
async fn post_body_carries_the_word() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(wiremock::matchers::body_string("user=root"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let opts = Options {
        url_template: format!("{}/login", server.uri()),
        body_template: "user=FUZZ".to_string(),
        method: reqwest::Method::POST,
        follow_redirects: false,
        status_filter: HashSet::from([302]),
        wordlist: inline(&["guest", "root", "admin"]),
        ..Options::default()
    };
    let report = run(opts).await;
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, Some(302));
}

#[tokio::test]
async fn results_stream_before_the_scan_ends() {
    let server = MockServer::start().await;
    not_found_everywhere(&server).await;

    let runner = Runner::new(options(&server, "/FUZZ", &["a", "b"])).unwrap();
    let mut scan = runner.start().await.unwrap();
    let first = scan.next().await;
    assert!(first.is_some());
    let summary = scan.finish().await.unwrap();
    assert_eq!(summary.dispatched, 2);
}

#[tokio::test]
async fn empty_wordlist_finishes_immediately() {
    let server = MockServer::start().await;
    let report = run(options(&server, "/FUZZ", &[])).await;
    assert!(report.results.is_empty());
    assert_eq!(report.summary.seeded, 0);
}
