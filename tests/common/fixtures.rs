use std::path::Path;

use scripture_nav::{Catalog, MockTransport, NavConfig, Navigator};

pub const VOLUMES_FIXTURE: &str = "tests/fixtures/volumes.json";
pub const BOOKS_FIXTURE: &str = "tests/fixtures/books.json";
/// Genesis 2 (book 101), with four geotags and two `navheading` divs.
pub const GENESIS_2_FIXTURE: &str = "tests/fixtures/genesis_2.html";

pub fn read_fixture(relative: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(relative);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read fixture {}: {}", path.display(), e))
}

pub fn catalog() -> Catalog {
    Catalog::from_json(&read_fixture(VOLUMES_FIXTURE), &read_fixture(BOOKS_FIXTURE))
        .expect("fixture catalog parses")
}

/// Transport serving the catalog endpoints and Genesis 2. Every other
/// chapter answers 404.
pub fn transport(config: &NavConfig) -> MockTransport {
    MockTransport::new()
        .with_body(config.volumes_url(), read_fixture(VOLUMES_FIXTURE))
        .with_body(config.books_url(), read_fixture(BOOKS_FIXTURE))
        .with_body(
            config.chapter_url(101, 2, None, false),
            read_fixture(GENESIS_2_FIXTURE),
        )
}

pub fn navigator_with(config: NavConfig) -> Navigator<MockTransport> {
    let config = config.normalized();
    let transport = transport(&config);
    Navigator::init(transport, config).expect("fixture navigator loads")
}

pub fn navigator() -> Navigator<MockTransport> {
    navigator_with(NavConfig::default())
}
