// Templates loaded from disk through FileSystemLoader

use std::fs;
use vellum::{
    CompileOptions, Context, Environment, Error, ErrorKind, FileSystemLoader, RenderError,
    RenderOptions,
};

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::create_dir(dir.path().join("partials")).unwrap();
    fs::write(
        dir.path().join("page.html"),
        "{% parse 'partials/header.html' %}<main>{{ page.body }}</main>{% include 'partials/footer.txt' %}",
    )
    .unwrap();
    fs::write(
        dir.path().join("partials/header.html"),
        "<h1>{{ page.title }}</h1>",
    )
    .unwrap();
    fs::write(dir.path().join("partials/footer.txt"), "{{ raw }}").unwrap();
    fs::write(dir.path().join("self.html"), "again {% parse 'self.html' %}").unwrap();
    fs::write(dir.path().join("ping.html"), "{% parse 'pong.html' %}").unwrap();
    fs::write(dir.path().join("pong.html"), "{% parse 'ping.html' %}").unwrap();
    dir
}

fn page_context() -> Context {
    Context::from_json(serde_json::json!({
        "page": { "title": "About", "body": "text" }
    }))
    .unwrap()
}

#[test]
fn test_render_file_with_parse_and_include() {
    let dir = site();
    let env = Environment::new(FileSystemLoader::new(dir.path()));
    let output = env.render_file("page.html", &mut page_context()).unwrap();
    assert_eq!(output, "<h1>About</h1><main>text</main>{{ raw }}");
}

#[test]
fn test_self_parse_on_disk() {
    let dir = site();
    let env = Environment::new(FileSystemLoader::new(dir.path()));
    let err = env.render_file("self.html", &mut Context::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Render(RenderError::SelfInclusion { ref path, .. }) if path == "self.html"
    ));
}

#[test]
fn test_mutual_parse_on_disk() {
    let dir = site();
    let env = Environment::new(FileSystemLoader::new(dir.path()));
    let err = env.render_file("ping.html", &mut Context::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Recursion);
}

#[test]
fn test_include_depth_limit() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..5 {
        fs::write(
            dir.path().join(format!("level{}.html", i)),
            format!("{}{{% parse 'level{}.html' %}}", i, i + 1),
        )
        .unwrap();
    }
    fs::write(dir.path().join("level5.html"), "5").unwrap();

    let env = Environment::new(FileSystemLoader::new(dir.path()));
    assert_eq!(
        env.render_file("level0.html", &mut Context::new()).unwrap(),
        "012345"
    );

    let shallow = Environment::new(FileSystemLoader::new(dir.path()))
        .with_render_options(RenderOptions::default().with_max_include_depth(3));
    let err = shallow
        .render_file("level0.html", &mut Context::new())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Render(RenderError::IncludeDepthExceeded { limit: 3, .. })
    ));
}

#[test]
fn test_missing_file() {
    let dir = site();
    let env = Environment::new(FileSystemLoader::new(dir.path()));
    let err = env
        .render_str("{% include 'nope.txt' %}", &mut Context::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.to_string(), "template 'nope.txt' not found at line 1, column 4");
}

#[test]
fn test_trim_blocks_applies_to_parsed_templates() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("list.html"), "{% list x as xs %}\n{{ x }}\n{% end %}\n").unwrap();

    let mut context: Context = [("xs", vec![1, 2])].into_iter().collect();
    let env = Environment::new(FileSystemLoader::new(dir.path()))
        .with_compile_options(CompileOptions::default().with_trim_blocks(true));
    assert_eq!(
        env.render_str("{% parse 'list.html' %}", &mut context).unwrap(),
        "1\n2\n"
    );
}
