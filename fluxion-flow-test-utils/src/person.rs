// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Person {
    pub name: String,
    pub age: u32,
}

impl Person {
    #[must_use]
    pub const fn new(name: String, age: u32) -> Self {
        Self { name, age }
    }

    #[must_use]
    pub const fn is_adult(&self) -> bool {
        self.age >= 18
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Person[name={}, age={}]", self.name, self.age)
    }
}

#[must_use]
pub fn person_alice() -> Person {
    Person::new("Alice".to_string(), 25)
}

#[must_use]
pub fn person_bob() -> Person {
    Person::new("Bob".to_string(), 12)
}

#[must_use]
pub fn person_charlie() -> Person {
    Person::new("Charlie".to_string(), 35)
}

#[must_use]
pub fn person_dave() -> Person {
    Person::new("Dave".to_string(), 17)
}

/// Alice, Bob, Charlie and Dave, in that order. Two adults, two minors.
#[must_use]
pub fn people() -> Vec<Person> {
    vec![person_alice(), person_bob(), person_charlie(), person_dave()]
}
