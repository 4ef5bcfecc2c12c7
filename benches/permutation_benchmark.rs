// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use curl_collide::permutation::{permute, permute_cmp};
use curl_collide::trit::{State, STATE_LENGTH};

fn full_permute(c: &mut Criterion) {
    let state: State = [1i8; STATE_LENGTH];
    c.bench_function("permute, 729-trit all-ones state", |b| {
        b.iter(|| {
            let mut s = black_box(state);
            permute(&mut s);
            black_box(s);
        })
    });
}

fn differential_permute(c: &mut Criterion) {
    let state_a: State = [0i8; STATE_LENGTH];
    let mut state_b: State = [0i8; STATE_LENGTH];
    state_b[0] = 1;
    c.bench_function("permute_cmp, single-trit differential", |b| {
        b.iter(|| {
            let mut a = black_box(state_a);
            let mut b = black_box(state_b);
            black_box(permute_cmp(&mut a, &mut b, 0).unwrap());
        })
    });
}

criterion_group!(benches, full_permute, differential_permute);
criterion_main!(benches);
