//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use rhtmx_client_router::{
    ElementHost, MemoryHistory, NavigationController, RouteElement, RouteParams, Router, Tail, TailParams,
};

/// Properties a route element received
#[derive(Debug, Default)]
pub struct ElementState {
    pub tag: String,
    pub serial: usize,
    pub route_params: RouteParams,
    pub query_params: Vec<(String, String)>,
    pub tail_params: TailParams,
    pub parent_route: Option<Tail>,
}

/// A fake DOM element: clones share state
#[derive(Debug, Clone, Default)]
pub struct TestElement(Rc<RefCell<ElementState>>);

impl TestElement {
    pub fn same_as(&self, other: &TestElement) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn serial(&self) -> usize {
        self.0.borrow().serial
    }

    pub fn tag(&self) -> String {
        self.0.borrow().tag.clone()
    }

    pub fn param(&self, name: &str) -> Option<String> {
        self.0.borrow().route_params.get(name).cloned().flatten()
    }

    pub fn query(&self) -> Vec<(String, String)> {
        self.0.borrow().query_params.clone()
    }

    pub fn tail_param(&self, name: &str) -> Option<String> {
        self.0.borrow().tail_params.get(name).cloned()
    }

    pub fn parent_route(&self) -> Option<Tail> {
        self.0.borrow().parent_route.clone()
    }
}

impl RouteElement for TestElement {
    fn set_route_params(&self, params: &RouteParams) {
        self.0.borrow_mut().route_params = params.clone();
    }

    fn set_query_params(&self, params: &[(String, String)]) {
        self.0.borrow_mut().query_params = params.to_vec();
    }

    fn set_tail_params(&self, params: &TailParams) {
        self.0.borrow_mut().tail_params = params.clone();
    }

    fn set_parent_route(&self, tail: Option<&Tail>) {
        self.0.borrow_mut().parent_route = tail.cloned();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Created(String, usize),
    Appended(Option<String>, usize),
    Activated(usize),
    Deactivating(usize),
    Removed(usize),
}

/// Replaces the location from inside `element_activated`, like a login guard
#[derive(Debug)]
pub struct Redirect {
    pub controller: Rc<NavigationController>,
    pub from: String,
    pub to: String,
}

/// Records every DOM operation; can veto removals
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub events: Vec<HostEvent>,
    pub attached: Vec<TestElement>,
    pub veto_removal: bool,
    pub redirect: Option<Redirect>,
    next_serial: usize,
}

impl RecordingHost {
    pub fn created(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, HostEvent::Created(..)))
            .count()
    }

    pub fn attached_tags(&self) -> Vec<String> {
        self.attached.iter().map(TestElement::tag).collect()
    }
}

impl ElementHost<TestElement> for RecordingHost {
    fn create_element(&mut self, tag: &str) -> TestElement {
        self.next_serial += 1;
        let element = TestElement::default();
        {
            let mut state = element.0.borrow_mut();
            state.tag = tag.to_string();
            state.serial = self.next_serial;
        }
        self.events.push(HostEvent::Created(tag.to_string(), self.next_serial));
        element
    }

    fn append_element(&mut self, target: Option<&str>, element: &TestElement) {
        self.events
            .push(HostEvent::Appended(target.map(str::to_string), element.serial()));
        if !self.attached.iter().any(|e| e.same_as(element)) {
            self.attached.push(element.clone());
        }
    }

    fn remove_element(&mut self, element: &TestElement) {
        self.events.push(HostEvent::Removed(element.serial()));
        self.attached.retain(|e| !e.same_as(element));
    }

    fn element_activated(&mut self, element: &TestElement) {
        self.events.push(HostEvent::Activated(element.serial()));
        if let Some(redirect) = &self.redirect {
            if redirect.controller.current_url() == redirect.from {
                redirect.controller.replace_url(&redirect.to, None);
            }
        }
    }

    fn element_deactivating(&mut self, element: &TestElement) -> bool {
        self.events.push(HostEvent::Deactivating(element.serial()));
        !self.veto_removal
    }
}

pub struct Fixture {
    pub controller: Rc<NavigationController>,
    pub host: Rc<RefCell<RecordingHost>>,
    pub router: Router<TestElement>,
}

pub fn fixture(url: &str) -> Fixture {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let controller = Rc::new(NavigationController::new(MemoryHistory::new(url)));
    let host = Rc::new(RefCell::new(RecordingHost::default()));
    let router = Router::new(controller.clone(), host.clone());
    Fixture {
        controller,
        host,
        router,
    }
}
