use std::cell::RefCell;
use std::rc::Rc;

use folio::{
    EventSink, Keyed, ObservationUnavailable, ObserverFactory, TrackerOptions, ViewportObserver,
};
use folio_adapter::{Project, ProjectFilter, RevealController, categories};

type Cards = Rc<RefCell<Vec<(String, u32)>>>;

/// A pretend host: each element handle is the card's top offset in px, cards are 100px tall.
#[derive(Default)]
struct ScrollHost {
    sink: Option<EventSink<String>>,
    cards: Cards,
}

struct ScrollObserver(Cards);

impl ViewportObserver<String, u32> for ScrollObserver {
    fn observe(&mut self, key: String, element: &u32) {
        self.0.borrow_mut().push((key, *element));
    }

    fn disconnect(&mut self) {
        self.0.borrow_mut().clear();
    }
}

impl ObserverFactory<String, u32> for ScrollHost {
    type Observer = ScrollObserver;

    fn create(
        &mut self,
        sink: EventSink<String>,
        _options: &TrackerOptions,
    ) -> Result<ScrollObserver, ObservationUnavailable> {
        self.sink = Some(sink);
        Ok(ScrollObserver(self.cards.clone()))
    }
}

impl ScrollHost {
    fn scroll_to(&self, top: u32, height: u32) {
        let Some(sink) = &self.sink else { return };
        for (key, y) in self.cards.borrow().iter() {
            sink.notify(key.clone(), *y + 100 > top && *y < top + height);
        }
    }
}

fn render(
    filter: &ProjectFilter,
    projects: &[Keyed<Project>],
    reveal: &mut RevealController<String, u32, ScrollHost>,
) -> usize {
    let listed = filter.apply(projects);
    let layout: Vec<u32> = (0..listed.len() as u32).map(|i| i * 100).collect();
    let elements: Vec<(String, Option<&u32>)> = listed
        .iter()
        .zip(&layout)
        .map(|(p, y)| (p.id.clone(), Some(y)))
        .collect();
    reveal.sync(filter.version(), elements)
}

fn main() {
    // Example: progressive reveal of a filtered project list.
    //
    // The adapter flow is typically:
    // 1) derive the listed items and a list version from the filter
    // 2) sync the controller with the rendered elements after every render
    // 3) pump queued events each frame and animate in newly visible cards
    let projects: Vec<Keyed<Project>> = [
        ("Ledger", "Web"),
        ("Pocket", "Mobile"),
        ("Relay", "Web"),
        ("Atlas", "Tooling"),
        ("Beacon", "Web"),
    ]
    .iter()
    .map(|(name, kind)| Keyed {
        id: name.to_lowercase(),
        data: Project {
            name: name.to_string(),
            kind: kind.to_string(),
            ..Project::default()
        },
    })
    .collect();
    println!("categories={:?}", categories(&projects));

    let mut filter = ProjectFilter::new();
    filter.sync_source(1);
    let mut reveal = RevealController::new(ScrollHost::default());

    let observed = render(&filter, &projects, &mut reveal);
    println!("observed={observed} version={:?}", filter.version());

    for top in [0u32, 150, 300] {
        reveal.factory().scroll_to(top, 200);
        reveal.pump();
        println!("scroll_top={top} visible={:?}", reveal.visible().as_slice());
    }

    // A different category is a different list: the reveal starts over.
    filter.select_category("Web");
    let observed = render(&filter, &projects, &mut reveal);
    reveal.factory().scroll_to(0, 200);
    reveal.pump();
    println!(
        "after filter: observed={observed} version={:?} visible={:?}",
        filter.version(),
        reveal.visible().as_slice()
    );
}
