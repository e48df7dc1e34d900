use crate::*;

use std::cell::RefCell;
use std::rc::Rc;

use folio::{
    EventSink, Keyed, ListVersion, MemoryStore, ObservationUnavailable, ObserverFactory,
    Projects, QueryCache, TrackerOptions, Unobservable, User, ViewportObserver,
};
use serde_json::json;

/// Everything the fake host saw, shared between the factory and its observers.
#[derive(Default)]
struct HostLog {
    created: usize,
    observed: Vec<u32>,
    disconnects: usize,
    thresholds: Vec<f32>,
    sinks: Vec<EventSink<u32>>,
}

#[derive(Clone, Default)]
struct FakeHost(Rc<RefCell<HostLog>>);

impl FakeHost {
    fn log(&self) -> std::cell::Ref<'_, HostLog> {
        self.0.borrow()
    }

    /// Reports `key` as entering the viewport through the most recently created observer.
    fn enter(&self, key: u32) -> bool {
        let log = self.0.borrow();
        log.sinks.last().is_some_and(|sink| sink.entered(key))
    }
}

struct FakeObserver(Rc<RefCell<HostLog>>);

impl ViewportObserver<u32, str> for FakeObserver {
    fn observe(&mut self, key: u32, _element: &str) {
        self.0.borrow_mut().observed.push(key);
    }

    fn disconnect(&mut self) {
        self.0.borrow_mut().disconnects += 1;
    }
}

impl ObserverFactory<u32, str> for FakeHost {
    type Observer = FakeObserver;

    fn create(
        &mut self,
        sink: EventSink<u32>,
        options: &TrackerOptions,
    ) -> Result<FakeObserver, ObservationUnavailable> {
        let mut log = self.0.borrow_mut();
        log.created += 1;
        log.thresholds.push(options.threshold);
        log.sinks.push(sink);
        Ok(FakeObserver(self.0.clone()))
    }
}

fn rendered(keys: &[u32]) -> Vec<(u32, Option<&'static str>)> {
    keys.iter().map(|&k| (k, Some("card"))).collect()
}

#[test]
fn sync_observes_rendered_elements_only() {
    let host = FakeHost::default();
    let mut c = RevealController::new(host.clone());

    let elements = vec![(1, Some("a")), (2, None), (3, Some("c"))];
    assert_eq!(c.sync(ListVersion(1), elements), 2);
    assert!(c.is_attached());
    assert_eq!(host.log().observed, [1, 3]);
    assert_eq!(host.log().thresholds, [folio::DEFAULT_REVEAL_THRESHOLD]);
}

#[test]
fn resync_disconnects_before_attaching_again() {
    let host = FakeHost::default();
    let mut c = RevealController::new(host.clone());

    c.sync(ListVersion(1), rendered(&[1, 2]));
    c.sync(ListVersion(1), rendered(&[1, 2, 3]));

    let log = host.log();
    assert_eq!(log.created, 2);
    assert_eq!(log.disconnects, 1);
    assert_eq!(log.observed, [1, 2, 1, 2, 3]);
}

#[test]
fn revealed_items_survive_a_resync_of_the_same_list() {
    let host = FakeHost::default();
    let mut c = RevealController::new(host.clone());

    c.sync(ListVersion(1), rendered(&[1, 2, 3]));
    assert!(host.enter(2));
    assert_eq!(c.pump(), 1);

    c.sync(ListVersion(1), rendered(&[1, 2, 3]));
    assert!(c.is_visible(&2));
    assert!(!c.is_visible(&1));
}

#[test]
fn a_new_list_version_starts_over() {
    let host = FakeHost::default();
    let mut c = RevealController::new(host.clone());

    c.sync(ListVersion(1), rendered(&[1, 2, 3]));
    host.enter(1);
    host.enter(3);
    c.pump();
    assert_eq!(c.visible().as_slice(), [1, 3]);

    c.sync(ListVersion(2), rendered(&[3, 4]));
    assert_eq!(c.version(), ListVersion(2));
    assert!(c.visible().is_empty());

    // Events from the first observer are stamped with the old version.
    let stale = host.log().sinks[0].clone();
    stale.entered(4);
    assert_eq!(c.pump(), 0);
    assert!(!c.is_visible(&4));

    host.enter(4);
    assert_eq!(c.pump(), 1);
    assert_eq!(c.visible().as_slice(), [4]);
}

#[test]
fn leaving_the_viewport_does_not_hide_an_item() {
    let host = FakeHost::default();
    let mut c = RevealController::new(host.clone());

    c.sync(ListVersion(1), rendered(&[7]));
    host.enter(7);
    host.log().sinks[0].notify(7, false);
    c.pump();
    assert!(c.is_visible(&7));
}

#[test]
fn empty_list_attaches_nothing() {
    let host = FakeHost::default();
    let mut c = RevealController::<u32, str, _>::new(host.clone());

    assert_eq!(c.sync(ListVersion(1), Vec::new()), 0);
    assert!(!c.is_attached());
    assert_eq!(host.log().created, 0);
}

#[test]
fn unobservable_host_reveals_every_item() {
    let mut c = RevealController::<u32, str, _>::new(Unobservable);

    assert_eq!(c.sync(ListVersion(1), vec![(1, Some("a")), (2, None), (3, Some("c"))]), 0);
    assert!(c.is_degraded());
    assert!(!c.is_attached());
    assert_eq!(c.visible().as_slice(), [1, 2, 3]);

    c.sync(ListVersion(2), rendered(&[9]));
    assert_eq!(c.visible().as_slice(), [9]);
}

#[test]
fn dropping_the_controller_disconnects() {
    let host = FakeHost::default();
    {
        let mut c = RevealController::new(host.clone());
        c.sync(ListVersion(1), rendered(&[1]));
    }
    assert_eq!(host.log().disconnects, 1);
}

#[test]
fn teardown_keeps_the_revealed_set() {
    let host = FakeHost::default();
    let mut c = RevealController::new(host.clone());
    c.sync(ListVersion(1), rendered(&[1, 2]));
    host.enter(1);
    c.pump();

    c.teardown();
    assert!(!c.is_attached());
    assert!(c.is_visible(&1));

    // No second disconnect on drop.
    drop(c);
    assert_eq!(host.log().disconnects, 1);
}

#[test]
fn custom_threshold_reaches_the_observer() {
    let host = FakeHost::default();
    let mut c =
        RevealController::with_options(host.clone(), TrackerOptions::new().with_threshold(0.5));
    c.sync(ListVersion(1), rendered(&[1]));
    assert_eq!(host.log().thresholds, [0.5]);
}

fn project(name: &str, description: &str, stack: &[&str], kind: &str) -> Keyed<Project> {
    Keyed {
        id: name.to_lowercase(),
        data: Project {
            name: name.to_string(),
            description: description.to_string(),
            stack: stack.iter().map(|s| s.to_string()).collect(),
            kind: kind.to_string(),
            ..Project::default()
        },
    }
}

fn catalog() -> Vec<Keyed<Project>> {
    vec![
        project("Ledger", "Personal finance tracker", &["Rust", "Postgres"], "Web"),
        project("Pocket", "Offline notes", &["Kotlin"], "Mobile"),
        project("Relay", "Chat bridge", &["Rust"], "Web"),
        project("Atlas", "Map tiles", &["TypeScript"], "Tooling"),
    ]
}

fn names<'a>(items: &[&'a Keyed<Project>]) -> Vec<&'a str> {
    items.iter().map(|p| p.data.name.as_str()).collect()
}

#[test]
fn filter_search_is_case_insensitive_over_name_description_and_stack() {
    let items = catalog();
    let mut f = ProjectFilter::new();

    assert_eq!(f.apply(&items).len(), 4);

    f.set_search("rust");
    assert_eq!(names(&f.apply(&items)), ["Ledger", "Relay"]);

    f.set_search("NOTES");
    assert_eq!(names(&f.apply(&items)), ["Pocket"]);

    f.set_search("atl");
    assert_eq!(names(&f.apply(&items)), ["Atlas"]);
}

#[test]
fn filter_category_combines_with_search() {
    let items = catalog();
    let mut f = ProjectFilter::new();

    f.select_category("Web");
    assert_eq!(names(&f.apply(&items)), ["Ledger", "Relay"]);

    f.set_search("chat");
    assert_eq!(names(&f.apply(&items)), ["Relay"]);

    f.select_category(ALL_CATEGORIES);
    assert_eq!(f.category(), None);
    assert_eq!(names(&f.apply(&items)), ["Relay"]);
}

#[test]
fn filter_version_moves_only_on_real_changes() {
    let mut f = ProjectFilter::new();
    let v0 = f.version();

    assert!(!f.set_search(""));
    assert!(!f.select_category(ALL_CATEGORIES));
    assert_eq!(f.version(), v0);

    assert!(f.set_search("rust"));
    let v1 = f.version();
    assert!(v1 > v0);
    assert!(!f.set_search("rust"));
    assert_eq!(f.version(), v1);

    assert!(f.select_category("Web"));
    assert!(f.sync_source(3));
    assert!(!f.sync_source(3));
    assert!(f.clear_search());
    assert_eq!(f.version(), ListVersion(v1.0 + 3));
}

#[test]
fn categories_list_all_first_then_first_seen_order() {
    assert_eq!(categories(&catalog()), ["All", "Web", "Mobile", "Tooling"]);
    assert_eq!(categories(&[]), ["All"]);
}

#[test]
fn project_decodes_camel_case_fields_and_legacy_url_names() {
    let raw = Keyed {
        id: "p1".to_string(),
        data: json!({
            "name": "Ledger",
            "description": "Finance",
            "stack": ["Rust"],
            "imageUrl": "https://img/ledger.png",
            "githubURL": "https://github.com/me/ledger",
            "previewUrl": "https://ledger.dev",
            "type": "Web",
            "status": "  ",
            "year": "2024"
        })
        .as_object()
        .cloned()
        .expect("object"),
    };

    let p = raw.decode::<Project>().expect("decodes");
    assert_eq!(p.id, "p1");
    assert_eq!(p.data.kind, "Web");
    assert_eq!(p.data.github_url.as_deref(), Some("https://github.com/me/ledger"));
    assert_eq!(p.data.preview_url.as_deref(), Some("https://ledger.dev"));
    assert_eq!(p.data.image_url.as_deref(), Some("https://img/ledger.png"));
    assert_eq!(p.data.status, None);
    assert!(!p.data.is_startup());
    assert_eq!(p.data.role, None);
    assert_eq!(p.data.year.as_deref(), Some("2024"));
}

#[test]
fn startup_status_parses_known_labels_and_keeps_unknown_ones() {
    let ok: Project =
        serde_json::from_value(json!({ "name": "Acme", "status": "Beta" })).expect("decodes");
    assert_eq!(ok.status, Some(ProjectStatus::Beta));
    assert!(ok.is_startup());

    let acquired: Project =
        serde_json::from_value(json!({ "name": "Acme", "status": "Acquired" })).expect("decodes");
    assert_eq!(acquired.status, Some(ProjectStatus::Acquired));

    let sold: Project =
        serde_json::from_value(json!({ "name": "Acme", "status": " Sold " })).expect("decodes");
    assert_eq!(sold.status, Some(ProjectStatus::Other("Sold".to_string())));
    assert!(sold.is_startup());
    assert_eq!(sold.status.as_ref().map(ProjectStatus::as_str), Some("Sold"));
    assert_eq!(
        serde_json::to_value(&sold).expect("encodes")["status"],
        json!("Sold")
    );

    assert_eq!("Active".parse::<ProjectStatus>(), Ok(ProjectStatus::Active));
    assert_eq!(
        "x".parse::<ProjectStatus>().unwrap_err().to_string(),
        "unknown project status \"x\""
    );
    assert_eq!(ProjectStatus::Pending.to_string(), "Pending");
    assert_eq!(ProjectStatus::from_label("Completed"), ProjectStatus::Completed);
}

#[test]
fn decode_projects_keeps_startups_with_unrecognised_status() {
    let docs = vec![Keyed {
        id: "s1".into(),
        data: json!({ "name": "Acme", "status": "Sold" })
            .as_object()
            .cloned()
            .unwrap(),
    }];
    let projects = decode_projects(&docs);
    assert_eq!(projects.len(), 1);
    assert_eq!(
        projects[0].data.status,
        Some(ProjectStatus::Other("Sold".into()))
    );
}

#[test]
fn decode_projects_skips_documents_without_a_name() {
    let docs = vec![
        Keyed { id: "a".into(), data: json!({ "name": "Ledger" }).as_object().cloned().unwrap() },
        Keyed { id: "b".into(), data: json!({ "title": "Nameless" }).as_object().cloned().unwrap() },
    ];
    let projects = decode_projects(&docs);
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id, "a");
}

#[test]
fn user_profile_exposes_contact_details() {
    let doc = json!({
        "userInfo": {
            "text_blocks": {
                "mail": "me@example.com",
                "phone": "+1 555 0100",
                "location": "Lisbon",
                "headline": "Engineer"
            },
            "image_blocks": { "profile": "https://img/me.png" },
            "skill_blocks": ["Rust", "SQL"]
        },
        "social_blocks": [{ "name": "GitHub", "href": "https://github.com/me" }]
    })
    .as_object()
    .cloned()
    .unwrap();

    let profile = UserProfile::first(&[doc]).expect("profile");
    let contact = profile.contact();
    assert_eq!(contact.mail.as_deref(), Some("me@example.com"));
    assert_eq!(contact.phone.as_deref(), Some("+1 555 0100"));
    assert_eq!(contact.location.as_deref(), Some("Lisbon"));
    assert_eq!(contact.socials[0].name, "GitHub");
    assert_eq!(profile.profile_image(), Some("https://img/me.png"));
    assert_eq!(profile.info.text_blocks.other["headline"], json!("Engineer"));
    assert_eq!(profile.info.skill_blocks, json!(["Rust", "SQL"]));

    assert_eq!(UserProfile::first(&[]), None);
}

#[tokio::test]
async fn cached_projects_feed_the_filter_and_reveal_lists() {
    let store = MemoryStore::new();
    for (name, kind) in [("Ledger", "Web"), ("Pocket", "Mobile")] {
        let fields = json!({ "name": name, "type": kind }).as_object().cloned().unwrap();
        store.insert("projects", fields);
    }
    store.insert(
        "user",
        json!({ "userInfo": { "text_blocks": { "mail": "me@example.com" } } })
            .as_object()
            .cloned()
            .unwrap(),
    );
    let cache = QueryCache::new(store);

    let projects = cache.fetch::<Projects>().await;
    assert!(projects.is_success());
    let items = decode_projects(&projects.data);

    let mut filter = ProjectFilter::new();
    filter.sync_source(projects.data_generation);
    filter.select_category("Mobile");
    let listed = filter.apply(&items);
    assert_eq!(names(&listed), ["Pocket"]);

    let mut reveal = RevealController::<String, str, _>::new(Unobservable);
    reveal.sync(
        filter.version(),
        listed.iter().map(|p| (p.id.clone(), None::<&str>)),
    );
    assert_eq!(reveal.visible().len(), 1);

    let user = cache.fetch::<User>().await;
    let profile = UserProfile::first(&user.data).expect("profile");
    assert_eq!(profile.contact().mail.as_deref(), Some("me@example.com"));
}

/// A host that reveals by document id; keeps every sink it handed out.
#[derive(Clone, Default)]
struct IdHost(Rc<RefCell<Vec<EventSink<String>>>>);

impl IdHost {
    fn enter(&self, id: &str) -> bool {
        self.0
            .borrow()
            .last()
            .is_some_and(|sink| sink.entered(id.to_string()))
    }
}

struct IdObserver;

impl ViewportObserver<String, str> for IdObserver {
    fn observe(&mut self, _key: String, _element: &str) {}

    fn disconnect(&mut self) {}
}

impl ObserverFactory<String, str> for IdHost {
    type Observer = IdObserver;

    fn create(
        &mut self,
        sink: EventSink<String>,
        _options: &TrackerOptions,
    ) -> Result<IdObserver, ObservationUnavailable> {
        self.0.borrow_mut().push(sink);
        Ok(IdObserver)
    }
}

fn render_ids(items: &[Keyed<Project>], filter: &ProjectFilter) -> Vec<(String, Option<&'static str>)> {
    filter
        .apply(items)
        .iter()
        .map(|p| (p.id.clone(), Some("card")))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn refetched_data_resets_the_reveal_once_it_is_published() {
    let store = MemoryStore::new().with_latency_ms(20);
    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        let fields = json!({ "name": name }).as_object().cloned().unwrap();
        ids.push(store.insert("projects", fields));
    }
    let cache = QueryCache::new(store.clone());
    let host = IdHost::default();
    let mut reveal = RevealController::new(host.clone());
    let mut filter = ProjectFilter::new();

    let first = cache.fetch::<Projects>().await;
    assert!(filter.sync_source(first.data_generation));
    let items = decode_projects(&first.data);
    reveal.sync(filter.version(), render_ids(&items, &filter));
    assert!(host.enter(&ids[0]));
    reveal.pump();
    assert!(reveal.is_visible(&ids[0]));
    let v1 = filter.version();

    store.delete("projects", &ids[0]);
    store.insert("projects", json!({ "name": "Z" }).as_object().cloned().unwrap());
    let mut handle = cache.refetch::<Projects>();

    // The pending result still lists A, B and C: same list.
    let pending = handle.current();
    assert!(pending.is_pending());
    assert_eq!(pending.data.len(), 3);
    assert!(!filter.sync_source(pending.data_generation));
    assert_eq!(filter.version(), v1);

    let settled = handle.settled().await;
    let items = decode_projects(&settled.data);
    let names: Vec<_> = items.iter().map(|p| p.data.name.as_str()).collect();
    assert_eq!(names, ["B", "C", "Z"]);
    assert!(filter.sync_source(settled.data_generation));
    assert!(filter.version() > v1);

    reveal.sync(filter.version(), render_ids(&items, &filter));
    assert!(reveal.visible().is_empty());
}
