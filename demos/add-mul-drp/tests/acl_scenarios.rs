//! Toy ACL integration tests exercising the scenarios in spec §8 that the
//! unit tests in `src/lib.rs` don't cover: grant/setKey/revoke (S3),
//! finality aggregation (S4), and a merge with a missing dependency (S5).

use add_mul_drp::{AddMulDrp, AddMulResolver};
use drp_acl::{encode_set_key_args, encode_target_group_args, AclGroup, ConflictResolutionPolicy, ObjectAcl};
use drp_core::{PeerId, SemanticsType};
use drp_hashgraph::Vertex;
use drp_object::{LocalSigner, Object, Signer};

fn new_peer(admins: Vec<PeerId>, signer: LocalSigner) -> Object<AddMulDrp> {
    let acl = ObjectAcl::new(admins, false, ConflictResolutionPolicy::GrantWins);
    Object::create_object(AddMulDrp::default(), acl, Box::new(AddMulResolver), SemanticsType::Pair, Box::new(signer))
}

fn frontier_vertices(object: &Object<AddMulDrp>) -> Vec<Vertex> {
    object.vertices().into_iter().cloned().collect()
}

#[test]
fn s3_grant_then_set_key_then_write_then_sign_then_revoke() {
    let signer_a = LocalSigner::generate().unwrap();
    let peer_a = signer_a.peer_id().clone();
    let signer_b = LocalSigner::generate().unwrap();
    let peer_b = signer_b.peer_id().clone();
    let b_bls_public = signer_b.public_bls();

    let mut a = new_peer(vec![peer_a.clone()], signer_a);
    let mut b = new_peer(vec![peer_a.clone()], signer_b);

    // Admin A grants B the Finality group.
    a.call_acl("grant", Some(encode_target_group_args(&peer_b, AclGroup::Finality)), 10).unwrap();
    b.apply_vertices(frontier_vertices(&a), 10);
    assert!(b.acl().query_is_finality_signer(&peer_b));

    // B signs its own BLS public key via setKey.
    b.call_acl("setKey", Some(encode_set_key_args(&b_bls_public)), 11).unwrap();
    a.apply_vertices(frontier_vertices(&b), 11);
    assert_eq!(a.acl().query_finality_group(), vec![(peer_b.clone(), b_bls_public)]);

    // A calls add(1) on the DRP; B signs the resulting vertex.
    a.call_drp("add", Some(AddMulDrp::encode(1)), 12).unwrap();
    let add_vertices = frontier_vertices(&a);
    b.apply_vertices(add_vertices.clone(), 12);
    let v_add1 = add_vertices[0].hash.clone();

    let sig_b = b.sign_bls(&v_add1).unwrap();
    b.finality_store_mut().add_signature(&v_add1, &peer_b, &sig_b, true).unwrap();
    assert_eq!(b.finality_store().number_of_signatures(&v_add1), 1);
    assert!(b.finality_store().get(&v_add1).unwrap().signers().contains(&peer_b));

    // Revoking B's Finality afterward doesn't touch v_add1's existing
    // attestation, but a vertex created after the revoke excludes B from
    // its signer set.
    a.call_acl("revoke", Some(encode_target_group_args(&peer_b, AclGroup::Finality)), 13).unwrap();
    b.apply_vertices(frontier_vertices(&a), 13);
    assert!(!b.acl().query_is_finality_signer(&peer_b));
    assert_eq!(b.finality_store().number_of_signatures(&v_add1), 1);

    a.call_drp("add", Some(AddMulDrp::encode(1)), 14).unwrap();
    let after_revoke = frontier_vertices(&a);
    b.apply_vertices(after_revoke.clone(), 14);
    let v_after_revoke = after_revoke[0].hash.clone();
    assert!(!b.finality_store().get(&v_after_revoke).unwrap().signers().contains(&peer_b));
}

#[test]
fn s4_finality_aggregation_across_two_signers() {
    let signer_a = LocalSigner::generate().unwrap();
    let peer_a = signer_a.peer_id().clone();
    let a_bls_public = signer_a.public_bls();
    let signer_b = LocalSigner::generate().unwrap();
    let peer_b = signer_b.peer_id().clone();
    let b_bls_public = signer_b.public_bls();

    let mut a = new_peer(vec![peer_a.clone()], signer_a);
    let mut b = new_peer(vec![peer_a.clone()], signer_b);

    a.call_acl("setKey", Some(encode_set_key_args(&a_bls_public)), 10).unwrap();
    b.apply_vertices(frontier_vertices(&a), 10);

    a.call_acl("grant", Some(encode_target_group_args(&peer_b, AclGroup::Finality)), 11).unwrap();
    b.apply_vertices(frontier_vertices(&a), 11);

    b.call_acl("setKey", Some(encode_set_key_args(&b_bls_public)), 12).unwrap();
    a.apply_vertices(frontier_vertices(&b), 12);

    a.call_drp("add", Some(AddMulDrp::encode(5)), 13).unwrap();
    let v = frontier_vertices(&a)[0].hash.clone();
    b.apply_vertices(frontier_vertices(&a), 13);

    let sig_a = a.sign_bls(&v).unwrap();
    let sig_b = b.sign_bls(&v).unwrap();

    a.finality_store_mut().add_signature(&v, &peer_a, &sig_a, true).unwrap();
    a.finality_store_mut().add_signature(&v, &peer_b, &sig_b, true).unwrap();
    assert_eq!(a.finality_store().number_of_signatures(&v), 2);
    assert!(a.finality_store().is_finalized(&v));
}

#[test]
fn s5_merge_with_missing_dependency_reports_missing() {
    let signer_a = LocalSigner::generate().unwrap();
    let peer_a = signer_a.peer_id().clone();
    let mut a = new_peer(vec![peer_a.clone()], signer_a);

    a.call_drp("add", Some(AddMulDrp::encode(1)), 10).unwrap();
    let v_parent = frontier_vertices(&a)[0].clone();

    a.call_drp("add", Some(AddMulDrp::encode(1)), 11).unwrap();
    let v_child = frontier_vertices(&a)[0].clone();

    let signer_x = LocalSigner::generate().unwrap();
    let mut x = new_peer(vec![peer_a], signer_x);

    let result = x.apply_vertices(vec![v_child.clone()], 20);
    assert!(!result.applied);
    assert_eq!(result.missing, vec![v_parent.hash.clone()]);
    assert!(!x.graph().contains(&v_child.hash));
}
