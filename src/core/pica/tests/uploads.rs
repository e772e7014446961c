// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::*;

const VS_UNIFORM_SETUP: usize = PicaRegs::VS_BASE + PicaRegs::SHADER_UNIFORM_SETUP;
const VS_UNIFORM_DATA: usize = PicaRegs::VS_BASE + PicaRegs::SHADER_UNIFORM_DATA;
const VS_PROGRAM_OFFSET: usize = PicaRegs::VS_BASE + PicaRegs::SHADER_PROGRAM_OFFSET;
const VS_PROGRAM_DATA: usize = PicaRegs::VS_BASE + PicaRegs::SHADER_PROGRAM_DATA;
const VS_SWIZZLE_OFFSET: usize = PicaRegs::VS_BASE + PicaRegs::SHADER_SWIZZLE_OFFSET;
const VS_SWIZZLE_DATA: usize = PicaRegs::VS_BASE + PicaRegs::SHADER_SWIZZLE_DATA;
const GS_PROGRAM_OFFSET: usize = PicaRegs::GS_BASE + PicaRegs::SHADER_PROGRAM_OFFSET;
const GS_PROGRAM_DATA: usize = PicaRegs::GS_BASE + PicaRegs::SHADER_PROGRAM_DATA;

#[test]
fn test_float24_uniform_upload() {
    let mut h = Harness::new();
    let words = pack_float24(Vec4::from_f32(1.0, 2.0, 3.0, 4.0));

    let list = ListBuilder::new()
        .write(VS_UNIFORM_SETUP, 5)
        .burst(VS_UNIFORM_DATA, &words, false);
    h.run(&list);

    assert_eq!(h.pica.vs_setup().uniforms.f[5].to_f32(), [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(h.pica.regs().uniform_setup(ShaderUnit::Vertex).index, 6);
}

#[test]
fn test_float32_uniform_upload() {
    let mut h = Harness::new();
    // Components arrive w, z, y, x
    let words = [4.0f32, 3.0, 2.0, 1.0].map(f32::to_bits);

    let list = ListBuilder::new()
        .write(VS_UNIFORM_SETUP, (1 << 31) | 10)
        .burst(VS_UNIFORM_DATA, &words, true);
    h.run(&list);

    assert_eq!(h.pica.vs_setup().uniforms.f[10].to_f32(), [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(h.pica.regs().uniform_setup(ShaderUnit::Vertex).index, 11);
}

#[test]
fn test_consecutive_uniforms_auto_increment() {
    let mut h = Harness::new();
    let mut words = Vec::new();
    words.extend(pack_float24(Vec4::from_f32(1.0, 1.0, 1.0, 1.0)));
    words.extend(pack_float24(Vec4::from_f32(2.0, 2.0, 2.0, 2.0)));

    let list = ListBuilder::new()
        .write(VS_UNIFORM_SETUP, 0)
        .burst(VS_UNIFORM_DATA, &words, false);
    h.run(&list);

    assert_eq!(h.pica.vs_setup().uniforms.f[0].to_f32(), [1.0; 4]);
    assert_eq!(h.pica.vs_setup().uniforms.f[1].to_f32(), [2.0; 4]);
    assert_eq!(h.pica.regs().uniform_setup(ShaderUnit::Vertex).index, 2);
}

#[test]
fn test_out_of_range_uniform_is_dropped() {
    let mut h = Harness::new();
    let words = pack_float24(Vec4::from_f32(1.0, 1.0, 1.0, 1.0));

    let list = ListBuilder::new()
        .write(VS_UNIFORM_SETUP, NUM_FLOAT_UNIFORMS as u32)
        .burst(VS_UNIFORM_DATA, &words, false);
    h.run(&list);

    assert_eq!(
        h.pica.regs().uniform_setup(ShaderUnit::Vertex).index,
        NUM_FLOAT_UNIFORMS as u32
    );
    assert!(h
        .pica
        .vs_setup()
        .uniforms
        .f
        .iter()
        .all(|f| *f == Vec4::default()));
}

#[test]
fn test_uniform_units_are_independent() {
    let mut h = Harness::new();
    let words = pack_float24(Vec4::from_f32(0.5, 0.5, 0.5, 0.5));

    // One word into the GS port must not complete a VS value
    h.write(PicaRegs::GS_BASE + PicaRegs::SHADER_UNIFORM_DATA, words[0]);
    h.write(VS_UNIFORM_DATA, words[0]);
    h.write(VS_UNIFORM_DATA, words[1]);
    assert_eq!(h.pica.regs().uniform_setup(ShaderUnit::Vertex).index, 0);

    h.write(VS_UNIFORM_DATA, words[2]);
    assert_eq!(h.pica.vs_setup().uniforms.f[0].to_f32(), [0.5; 4]);
    assert_eq!(h.pica.gs_setup().uniforms.f[0], Vec4::default());
}

#[test]
fn test_bool_and_int_uniforms() {
    let mut h = Harness::new();
    h.write(PicaRegs::VS_BASE + PicaRegs::SHADER_BOOL_UNIFORMS, 0b1000_0101);
    h.write(PicaRegs::VS_BASE + PicaRegs::SHADER_INT_UNIFORMS + 2, 0x0403_0201);

    let uniforms = &h.pica.vs_setup().uniforms;
    assert!(uniforms.b[0]);
    assert!(!uniforms.b[1]);
    assert!(uniforms.b[2]);
    assert!(uniforms.b[7]);
    assert_eq!(uniforms.i[2], Vec4::new(1, 2, 3, 4));
    assert!(!h.pica.gs_setup().uniforms.b[0]);
}

#[test]
fn test_vs_program_upload_mirrors_to_gs() {
    let mut h = Harness::new();
    let list = ListBuilder::new()
        .write(VS_PROGRAM_OFFSET, 10)
        .burst(VS_PROGRAM_DATA, &[0xAA, 0xBB], true);
    h.run(&list);

    assert_eq!(h.pica.vs_setup().program_code[10..12], [0xAA, 0xBB]);
    assert_eq!(h.pica.gs_setup().program_code[10..12], [0xAA, 0xBB]);
    assert_eq!(h.pica.regs().program_offset(ShaderUnit::Vertex), 12);
    assert!(h.pica.vs_setup().is_program_code_dirty());
}

#[test]
fn test_exclusive_gs_is_not_mirrored() {
    let mut h = Harness::new();
    let list = ListBuilder::new()
        .write(PicaRegs::GS_UNIT_EXCLUSIVE_CONFIGURATION, 1)
        .write(VS_PROGRAM_OFFSET, 0)
        .write(VS_PROGRAM_DATA, 0x1234)
        .write(VS_SWIZZLE_OFFSET, 0)
        .write(VS_SWIZZLE_DATA, 0x5678);
    h.run(&list);

    assert_eq!(h.pica.vs_setup().program_code[0], 0x1234);
    assert_eq!(h.pica.gs_setup().program_code[0], 0);
    assert_eq!(h.pica.vs_setup().swizzle_data[0], 0x5678);
    assert_eq!(h.pica.gs_setup().swizzle_data[0], 0);
}

#[test]
fn test_program_offset_bounds() {
    let mut h = Harness::new();
    let list = ListBuilder::new()
        .write(VS_PROGRAM_OFFSET, MAX_VS_PROGRAM_LENGTH)
        .write(VS_PROGRAM_DATA, 0xFFFF)
        .write(GS_PROGRAM_OFFSET, MAX_PROGRAM_CODE_LENGTH as u32)
        .write(GS_PROGRAM_DATA, 0xFFFF)
        .write(GS_PROGRAM_OFFSET, MAX_PROGRAM_CODE_LENGTH as u32 - 1)
        .write(GS_PROGRAM_DATA, 0x9999);
    h.run(&list);

    // Rejected writes leave the offset alone
    assert_eq!(
        h.pica.regs().program_offset(ShaderUnit::Vertex),
        MAX_VS_PROGRAM_LENGTH
    );
    assert!(h.pica.vs_setup().program_code.iter().all(|&w| w == 0));

    // The GS accepts the full program space
    assert_eq!(h.pica.gs_setup().program_code[MAX_PROGRAM_CODE_LENGTH - 1], 0x9999);
    assert_eq!(
        h.pica.regs().program_offset(ShaderUnit::Geometry),
        MAX_PROGRAM_CODE_LENGTH as u32
    );
}

#[test]
fn test_swizzle_upload_and_bounds() {
    let mut h = Harness::new();
    let list = ListBuilder::new()
        .write(VS_SWIZZLE_OFFSET, 600)
        .write(VS_SWIZZLE_DATA, 0xC0DE)
        .write(VS_SWIZZLE_OFFSET, MAX_SWIZZLE_DATA_LENGTH as u32)
        .write(VS_SWIZZLE_DATA, 0xBAD);
    h.run(&list);

    // Swizzle patterns are not limited to the VS program length
    assert_eq!(h.pica.vs_setup().swizzle_data[600], 0xC0DE);
    assert_eq!(h.pica.gs_setup().swizzle_data[600], 0xC0DE);
    assert_eq!(
        h.pica.regs().swizzle_offset(ShaderUnit::Vertex),
        MAX_SWIZZLE_DATA_LENGTH as u32
    );
}

#[test]
fn test_lighting_lut_index_wraps() {
    let mut h = Harness::new();
    let list = ListBuilder::new()
        .write(PicaRegs::LIGHTING_LUT_CONFIG, (3 << 8) | 255)
        .burst(PicaRegs::LIGHTING_LUT_DATA, &[0x11, 0x22], true);
    h.run(&list);

    let lut = &h.pica.luts().lighting.luts[3];
    assert_eq!(lut[255], 0x11);
    assert_eq!(lut[0], 0x22);
    assert_eq!(h.pica.regs().lighting_lut_index(), 1);
}

#[test]
fn test_lighting_lut_bad_type_is_dropped() {
    let mut h = Harness::new();
    let list = ListBuilder::new()
        .write(PicaRegs::LIGHTING_LUT_CONFIG, (NUM_LIGHTING_SAMPLERS as u32) << 8)
        .write(PicaRegs::LIGHTING_LUT_DATA, 0x33);
    h.run(&list);

    assert_eq!(h.pica.regs().lighting_lut_index(), 0);
    assert!(h
        .pica
        .luts()
        .lighting
        .luts
        .iter()
        .all(|lut| lut.iter().all(|&v| v == 0)));
}

#[test]
fn test_fog_lut_wraps() {
    let mut h = Harness::new();
    let list = ListBuilder::new()
        .write(PicaRegs::FOG_LUT_OFFSET, 127)
        .burst(PicaRegs::FOG_LUT_DATA, &[0xA, 0xB], false);
    h.run(&list);

    assert_eq!(h.pica.luts().fog.lut[127], 0xA);
    assert_eq!(h.pica.luts().fog.lut[0], 0xB);
    // The offset register keeps counting past the table
    assert_eq!(h.pica.regs().fog_lut_offset(), 129);
}

#[test]
fn test_fog_lut_offset_reads_back_unwrapped() {
    let mut h = Harness::new();
    let list = ListBuilder::new()
        .write(PicaRegs::FOG_LUT_OFFSET, 0x205)
        .write(PicaRegs::FOG_LUT_DATA, 0x77);
    h.run(&list);

    assert_eq!(h.pica.luts().fog.lut[0x05], 0x77);
    assert_eq!(h.pica.regs().fog_lut_offset(), 0x206);
}

#[test]
fn test_proctex_lut_tables() {
    let mut h = Harness::new();
    let list = ListBuilder::new()
        .write(PicaRegs::PROCTEX_LUT_CONFIG, (4 << 8) | 200)
        .write(PicaRegs::PROCTEX_LUT_DATA, 0xC010)
        .write(PicaRegs::PROCTEX_LUT_CONFIG, 3 << 8)
        .write(PicaRegs::PROCTEX_LUT_DATA, 0xA1FA);
    h.run(&list);

    let proctex = &h.pica.luts().proctex;
    assert_eq!(proctex.color_table[200], 0xC010);
    assert_eq!(proctex.alpha_map_table[0], 0xA1FA);
    assert_eq!(h.pica.regs().proctex_lut_index(), 1);
}

#[test]
fn test_proctex_unknown_table_still_advances() {
    let mut h = Harness::new();
    let list = ListBuilder::new()
        .write(PicaRegs::PROCTEX_LUT_CONFIG, (1 << 8) | 7)
        .write(PicaRegs::PROCTEX_LUT_DATA, 0xFF);
    h.run(&list);

    assert_eq!(h.pica.regs().proctex_lut_index(), 8);
    assert!(h.pica.luts().proctex.noise_table.iter().all(|&v| v == 0));
}

#[test]
fn test_default_attribute_upload() {
    let mut h = Harness::new();
    let words = pack_float24(Vec4::from_f32(0.0, 0.25, 0.5, 1.0));

    let list = ListBuilder::new()
        .write(PicaRegs::DEFAULT_ATTRIBUTE_INDEX, 2)
        .burst(PicaRegs::DEFAULT_ATTRIBUTE_DATA, &words, true);
    h.run(&list);

    assert_eq!(
        h.pica.default_attributes().attr[2].to_f32(),
        [0.0, 0.25, 0.5, 1.0]
    );
    assert_eq!(h.pica.regs().default_attribute_index(), 3);
}

#[test]
fn test_default_attribute_index_write_discards_partial_value() {
    let mut h = Harness::new();
    let words = pack_float24(Vec4::from_f32(1.0, 1.0, 1.0, 1.0));

    h.write(PicaRegs::DEFAULT_ATTRIBUTE_INDEX, 0);
    h.write(PicaRegs::DEFAULT_ATTRIBUTE_DATA, 0xFFFF_FFFF);
    h.write(PicaRegs::DEFAULT_ATTRIBUTE_INDEX, 1);
    for word in words {
        h.write(PicaRegs::DEFAULT_ATTRIBUTE_DATA, word);
    }

    assert_eq!(h.pica.default_attributes().attr[0], Vec4::default());
    assert_eq!(h.pica.default_attributes().attr[1].to_f32(), [1.0; 4]);
    assert!(h.pica.immediate_mode().reset_geometry_pipeline);
}
